//! Triangle-strip expansion and adjacent-surface merging.

use crate::context::{TrContext, TR_MAX_INDICES};

/// Expand a list's strips into CCW indexed triangles, merging each maximal
/// run of surfaces whose packed draw state is identical into one surface.
///
/// Strips arrive with their vertices in CW order:
///
///   1----3----5
///   |\   |\   |
///   | \  | \  |
///   |  \ |  \ |
///   |   \|   \|
///   0----2----4
///
/// so triangles at an even strip offset swap their last two indices to
/// come out CCW.
pub(crate) fn generate_indices(rc: &mut TrContext, list_type: usize) {
    let num_list_surfs = rc.lists[list_type].num_surfs;
    let mut num_merged = 0;

    let mut i = 0;
    while i < num_list_surfs {
        let root_index = rc.lists[list_type].surfs[i] as usize;
        let first_index = rc.num_indices;

        // walk the mergeable run starting at i
        let mut j = i;
        while j < num_list_surfs {
            let surf_index = rc.lists[list_type].surfs[j] as usize;

            if j != i {
                if rc.surfs[surf_index].params.full() != rc.surfs[root_index].params.full() {
                    break;
                }
                num_merged += 1;
            }

            let surf = rc.surfs[surf_index];
            let num_tris = (surf.num_verts as usize).saturating_sub(2);
            assert!(
                rc.num_indices + num_tris * 3 <= TR_MAX_INDICES,
                "index buffer overflow"
            );

            for t in 0..num_tris {
                let strip_offset = surf.strip_offset as usize + t;
                let vert_offset = surf.first_vert + t as u32;

                if strip_offset & 1 != 0 {
                    rc.indices[rc.num_indices] = vert_offset;
                    rc.indices[rc.num_indices + 1] = vert_offset + 1;
                    rc.indices[rc.num_indices + 2] = vert_offset + 2;
                } else {
                    rc.indices[rc.num_indices] = vert_offset;
                    rc.indices[rc.num_indices + 1] = vert_offset + 2;
                    rc.indices[rc.num_indices + 2] = vert_offset + 1;
                }
                rc.num_indices += 3;
            }

            j += 1;
        }

        // the run's root now points at its triangle indices
        let root = &mut rc.surfs[root_index];
        root.first_vert = first_index as u32;
        root.num_verts = (rc.num_indices - first_index) as u32;

        // compact the list over the merged entries
        rc.lists[list_type].surfs[j - num_merged - 1] = root_index as u32;

        i = j;
    }

    rc.lists[list_type].num_surfs -= num_merged;
}
