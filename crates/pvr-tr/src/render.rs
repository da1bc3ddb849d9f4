//! Draw-call emission for a converted context.

use pvr_core::types::{LIST_OPAQUE, LIST_PUNCH_THROUGH, LIST_TRANSLUCENT};

use crate::backend::RenderBackend;
use crate::context::TrContext;

fn render_list(
    r: &mut dyn RenderBackend,
    rc: &TrContext,
    list_type: u32,
    end_surf: Option<u32>,
    stopped: &mut bool,
) {
    if *stopped {
        return;
    }

    let list = &rc.lists[list_type as usize];
    for &surf in &list.surfs[..list.num_surfs] {
        r.draw_ta_surface(&rc.surfs[surf as usize]);

        if Some(surf) == end_surf {
            *stopped = true;
            break;
        }
    }
}

/// Draw the context's lists in hardware pass order, stopping after the
/// surface whose index equals `end_surf`. This is the step-through hook
/// for debugging.
pub fn render_context_until(r: &mut dyn RenderBackend, rc: &TrContext, end_surf: Option<u32>) {
    let mut stopped = false;

    r.begin_ta_surfaces(
        rc.width,
        rc.height,
        &rc.verts[..rc.num_verts],
        &rc.indices[..rc.num_indices],
    );

    render_list(r, rc, LIST_OPAQUE, end_surf, &mut stopped);
    render_list(r, rc, LIST_PUNCH_THROUGH, end_surf, &mut stopped);
    render_list(r, rc, LIST_TRANSLUCENT, end_surf, &mut stopped);

    r.end_ta_surfaces();
}

/// Draw every surface of the context.
pub fn render_context(r: &mut dyn RenderBackend, rc: &TrContext) {
    render_context_until(r, rc, None);
}
