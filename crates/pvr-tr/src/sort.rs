//! Back-to-front ordering of per-triangle surfaces.

use crate::context::TrContext;

/// Stable bottom-up merge sort over `items` using caller-provided scratch.
/// `le` taking from the left run on ties is what makes it stable.
pub(crate) fn msort_noalloc<F>(items: &mut [u32], tmp: &mut [u32], le: F)
where
    F: Fn(u32, u32) -> bool,
{
    let n = items.len();
    let tmp = &mut tmp[..n];

    let mut width = 1;
    while width < n {
        let mut lo = 0;
        while lo < n {
            let mid = (lo + width).min(n);
            let hi = (lo + 2 * width).min(n);
            merge(&items[lo..mid], &items[mid..hi], &mut tmp[lo..hi], &le);
            lo = hi;
        }
        items.copy_from_slice(tmp);
        width *= 2;
    }
}

fn merge<F>(left: &[u32], right: &[u32], out: &mut [u32], le: &F)
where
    F: Fn(u32, u32) -> bool,
{
    let mut i = 0;
    let mut j = 0;
    let mut k = 0;

    while i < left.len() && j < right.len() {
        if le(left[i], right[j]) {
            out[k] = left[i];
            i += 1;
        } else {
            out[k] = right[j];
            j += 1;
        }
        k += 1;
    }
    out[k..k + left.len() - i].copy_from_slice(&left[i..]);
    k += left.len() - i;
    out[k..].copy_from_slice(&right[j..]);
}

/// Sort a list's surfaces back to front by their minimum z. Every surface
/// in a sortable list is a single triangle; ties keep their submission
/// order so layered decals draw correctly.
pub(crate) fn sort_surfaces(rc: &mut TrContext, list_type: u32) {
    let TrContext {
        lists,
        surfs,
        verts,
        sort_minz,
        sort_tmp,
        ..
    } = rc;
    let list = &mut lists[list_type as usize];

    for n in 0..list.num_surfs {
        let surf_index = list.surfs[n] as usize;
        let surf = &surfs[surf_index];
        assert_eq!(surf.num_verts, 3);

        let v = &verts[surf.first_vert as usize..surf.first_vert as usize + 3];
        sort_minz[surf_index] = v[0].xyz[2].min(v[1].xyz[2]).min(v[2].xyz[2]);
    }

    msort_noalloc(&mut list.surfs[..list.num_surfs], sort_tmp, |a, b| {
        sort_minz[a as usize] <= sort_minz[b as usize]
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_ascending() {
        let keys = [0.9f32, 0.1, 0.5, 0.3, 0.7];
        let mut items: Vec<u32> = (0..keys.len() as u32).collect();
        let mut tmp = vec![0u32; items.len()];

        msort_noalloc(&mut items, &mut tmp, |a, b| {
            keys[a as usize] <= keys[b as usize]
        });

        assert_eq!(items, [1, 3, 2, 4, 0]);
    }

    #[test]
    fn stable_on_equal_keys() {
        // indices 0..6 all share key groups; equal keys must keep their
        // original relative order
        let keys = [0.5f32, 0.1, 0.5, 0.1, 0.5, 0.1];
        let mut items: Vec<u32> = (0..keys.len() as u32).collect();
        let mut tmp = vec![0u32; items.len()];

        msort_noalloc(&mut items, &mut tmp, |a, b| {
            keys[a as usize] <= keys[b as usize]
        });

        assert_eq!(items, [1, 3, 5, 0, 2, 4]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let keys = [0.4f32, 0.4, 0.2, 0.9, 0.2];
        let mut items: Vec<u32> = (0..keys.len() as u32).collect();
        let mut tmp = vec![0u32; items.len()];

        let le = |a: u32, b: u32| keys[a as usize] <= keys[b as usize];
        msort_noalloc(&mut items, &mut tmp, le);
        let once = items.clone();
        msort_noalloc(&mut items, &mut tmp, le);

        assert_eq!(items, once);
    }

    #[test]
    fn empty_and_single() {
        let mut tmp = vec![0u32; 4];
        let mut empty: Vec<u32> = vec![];
        msort_noalloc(&mut empty, &mut tmp, |_, _| true);
        assert!(empty.is_empty());

        let mut one = vec![7u32];
        msort_noalloc(&mut one, &mut tmp, |_, _| true);
        assert_eq!(one, [7]);
    }
}
