//! Red-black balancing: recoloring plus at most three rotations per update.

use log::trace;

use crate::augment::Augment;
use crate::balance::Balancer;
use crate::bst;
use crate::error::TreeError;
use crate::types::{NodeId, NodeStore, NodeStoreMut};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    Red,
    Black,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedBlack;

#[inline]
fn is_red<T, S>(store: &S, id: Option<NodeId>) -> bool
where
    S: NodeStore<T, Meta = Color> + ?Sized,
{
    id.is_some_and(|n| *store.meta(n) == Color::Red)
}

#[inline]
fn paint<T, S>(store: &mut S, id: Option<NodeId>, color: Color)
where
    S: NodeStoreMut<T, Meta = Color> + ?Sized,
{
    if let Some(n) = id {
        *store.meta_mut(n) = color;
    }
}

fn insert_fixup<T, S, A>(store: &mut S, root: &mut Option<NodeId>, mut z: NodeId, aug: &A)
where
    S: NodeStoreMut<T, Meta = Color> + ?Sized,
    A: Augment<T, S> + ?Sized,
{
    while let Some(p) = store.parent(z) {
        if !is_red::<T, S>(store, Some(p)) {
            break;
        }
        let Some(g) = store.parent(p) else {
            break;
        };
        if store.left(g) == Some(p) {
            let uncle = store.right(g);
            if is_red::<T, S>(store, uncle) {
                paint::<T, S>(store, Some(p), Color::Black);
                paint::<T, S>(store, uncle, Color::Black);
                paint::<T, S>(store, Some(g), Color::Red);
                z = g;
                continue;
            }
            let mut p = p;
            if store.right(p) == Some(z) {
                z = p;
                p = bst::rotate_left::<T, S, A>(store, root, z, aug);
            }
            paint::<T, S>(store, Some(p), Color::Black);
            paint::<T, S>(store, Some(g), Color::Red);
            bst::rotate_right::<T, S, A>(store, root, g, aug);
        } else {
            let uncle = store.left(g);
            if is_red::<T, S>(store, uncle) {
                paint::<T, S>(store, Some(p), Color::Black);
                paint::<T, S>(store, uncle, Color::Black);
                paint::<T, S>(store, Some(g), Color::Red);
                z = g;
                continue;
            }
            let mut p = p;
            if store.left(p) == Some(z) {
                z = p;
                p = bst::rotate_right::<T, S, A>(store, root, z, aug);
            }
            paint::<T, S>(store, Some(p), Color::Black);
            paint::<T, S>(store, Some(g), Color::Red);
            bst::rotate_left::<T, S, A>(store, root, g, aug);
        }
    }
    paint::<T, S>(store, *root, Color::Black);
}

/// Restores black height after a black node was spliced out. `x` took the
/// removed position under `parent` and may be absent.
fn remove_fixup<T, S, A>(
    store: &mut S,
    root: &mut Option<NodeId>,
    mut x: Option<NodeId>,
    mut parent: Option<NodeId>,
    aug: &A,
) where
    S: NodeStoreMut<T, Meta = Color> + ?Sized,
    A: Augment<T, S> + ?Sized,
{
    while x != *root && !is_red::<T, S>(store, x) {
        let Some(p) = parent else {
            break;
        };
        if store.left(p) == x {
            let Some(mut w) = store.right(p) else {
                break;
            };
            if is_red::<T, S>(store, Some(w)) {
                paint::<T, S>(store, Some(w), Color::Black);
                paint::<T, S>(store, Some(p), Color::Red);
                bst::rotate_left::<T, S, A>(store, root, p, aug);
                match store.right(p) {
                    Some(next) => w = next,
                    None => break,
                }
            }
            if !is_red::<T, S>(store, store.left(w)) && !is_red::<T, S>(store, store.right(w)) {
                paint::<T, S>(store, Some(w), Color::Red);
                x = Some(p);
                parent = store.parent(p);
                continue;
            }
            if !is_red::<T, S>(store, store.right(w)) {
                let inner = store.left(w);
                paint::<T, S>(store, inner, Color::Black);
                paint::<T, S>(store, Some(w), Color::Red);
                w = bst::rotate_right::<T, S, A>(store, root, w, aug);
            }
            let color = *store.meta(p);
            paint::<T, S>(store, Some(w), color);
            paint::<T, S>(store, Some(p), Color::Black);
            let outer = store.right(w);
            paint::<T, S>(store, outer, Color::Black);
            bst::rotate_left::<T, S, A>(store, root, p, aug);
            x = *root;
            parent = None;
        } else {
            let Some(mut w) = store.left(p) else {
                break;
            };
            if is_red::<T, S>(store, Some(w)) {
                paint::<T, S>(store, Some(w), Color::Black);
                paint::<T, S>(store, Some(p), Color::Red);
                bst::rotate_right::<T, S, A>(store, root, p, aug);
                match store.left(p) {
                    Some(next) => w = next,
                    None => break,
                }
            }
            if !is_red::<T, S>(store, store.left(w)) && !is_red::<T, S>(store, store.right(w)) {
                paint::<T, S>(store, Some(w), Color::Red);
                x = Some(p);
                parent = store.parent(p);
                continue;
            }
            if !is_red::<T, S>(store, store.left(w)) {
                let inner = store.right(w);
                paint::<T, S>(store, inner, Color::Black);
                paint::<T, S>(store, Some(w), Color::Red);
                w = bst::rotate_left::<T, S, A>(store, root, w, aug);
            }
            let color = *store.meta(p);
            paint::<T, S>(store, Some(w), color);
            paint::<T, S>(store, Some(p), Color::Black);
            let outer = store.left(w);
            paint::<T, S>(store, outer, Color::Black);
            bst::rotate_right::<T, S, A>(store, root, p, aug);
            x = *root;
            parent = None;
        }
    }
    paint::<T, S>(store, x, Color::Black);
}

/// Black height of the subtree at `id`, counting the nil leaves.
fn black_height<T, S>(store: &S, id: Option<NodeId>) -> Result<usize, TreeError>
where
    S: NodeStore<T, Meta = Color> + ?Sized,
{
    let Some(n) = id else {
        return Ok(1);
    };
    let (l, r) = (store.left(n), store.right(n));
    let red = is_red::<T, S>(store, Some(n));
    if red && (is_red::<T, S>(store, l) || is_red::<T, S>(store, r)) {
        return Err(TreeError::RedRed(n));
    }
    let lh = black_height::<T, S>(store, l)?;
    let rh = black_height::<T, S>(store, r)?;
    if lh != rh {
        return Err(TreeError::BlackHeight(n));
    }
    Ok(lh + usize::from(!red))
}

impl Balancer for RedBlack {
    type Meta = Color;

    fn insert<T, S, A, F>(
        &mut self,
        store: &mut S,
        root: &mut Option<NodeId>,
        id: NodeId,
        goes_after: F,
        aug: &A,
    ) where
        S: NodeStoreMut<T, Meta = Color> + ?Sized,
        A: Augment<T, S> + ?Sized,
        F: FnMut(&S, NodeId) -> bool,
    {
        *store.meta_mut(id) = Color::Red;
        bst::insert_leaf::<T, S, A, F>(store, root, id, goes_after, aug);
        insert_fixup::<T, S, A>(store, root, id, aug);
    }

    fn remove<T, S, A>(&mut self, store: &mut S, root: &mut Option<NodeId>, id: NodeId, aug: &A)
    where
        S: NodeStoreMut<T, Meta = Color> + ?Sized,
        A: Augment<T, S> + ?Sized,
    {
        let detached = bst::detach::<T, S, A>(store, root, id, aug);
        if detached.meta == Color::Black {
            trace!("node {id} removed black, fixing up");
            remove_fixup::<T, S, A>(store, root, detached.child, detached.parent, aug);
        }
    }

    fn verify<T, S>(&self, store: &S, root: Option<NodeId>) -> Result<(), TreeError>
    where
        S: NodeStore<T, Meta = Color> + ?Sized,
    {
        if let Some(r) = root {
            if is_red::<T, S>(store, Some(r)) {
                return Err(TreeError::RedRoot(r));
            }
        }
        black_height::<T, S>(store, root).map(|_| ())
    }
}
