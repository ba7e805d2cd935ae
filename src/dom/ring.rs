//! Sibling Ring - intrusive circular doubly-linked sibling lists
//!
//! Every node carries its own `{parent, next, prev}` links. The children of
//! a parent (and the attributes of a tag) form a circular ring; the parent
//! only remembers the head, and the tail is `head.prev`, so append and
//! detach are O(1). A detached node links to itself.
//!
//! The operations here are generic over anything that can hand out links by
//! id, so the tree assembler and the public document API share one
//! implementation.

use super::node::NodeId;
use crate::error::{Error, Result};

/// Ring membership of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Links {
    pub parent: Option<NodeId>,
    pub next: NodeId,
    pub prev: NodeId,
}

impl Links {
    /// Links of a node belonging to no ring
    #[inline]
    pub const fn detached(id: NodeId) -> Self {
        Links {
            parent: None,
            next: id,
            prev: id,
        }
    }
}

/// Storage that can hand out ring links by node id
pub trait RingArena {
    fn links(&self, id: NodeId) -> &Links;
    fn links_mut(&mut self, id: NodeId) -> &mut Links;
}

/// Append a detached `element` at the tail of `parent`'s ring whose head is
/// `ring` (None when the ring is empty). Returns the ring head.
pub fn attach<A: RingArena + ?Sized>(
    arena: &mut A,
    element: NodeId,
    parent: NodeId,
    ring: Option<NodeId>,
) -> Result<NodeId> {
    if arena.links(element).parent.is_some() {
        return Err(Error::AlreadyAttached(element));
    }
    let Some(head) = ring else {
        *arena.links_mut(element) = Links {
            parent: Some(parent),
            next: element,
            prev: element,
        };
        return Ok(element);
    };

    let tail = arena.links(head).prev;
    *arena.links_mut(element) = Links {
        parent: Some(parent),
        next: head,
        prev: tail,
    };
    arena.links_mut(tail).next = element;
    arena.links_mut(head).prev = element;
    Ok(head)
}

/// Remove `element` from `parent`'s ring whose head is `ring`. Returns the
/// new head, or None when the ring became empty.
pub fn detach<A: RingArena + ?Sized>(
    arena: &mut A,
    element: NodeId,
    parent: NodeId,
    ring: NodeId,
) -> Result<Option<NodeId>> {
    if arena.links(element).parent != Some(parent) {
        return Err(Error::NotInRing { node: element, parent });
    }
    let Links { next, prev, .. } = *arena.links(element);
    *arena.links_mut(element) = Links::detached(element);
    if next == element {
        return Ok(None);
    }

    arena.links_mut(prev).next = next;
    arena.links_mut(next).prev = prev;
    Ok(Some(if ring == element { next } else { ring }))
}

/// Cut the ring headed by `ring` in two at `at`: `at` and every element
/// after it form a separate ring. Returns `(prefix head, suffix head)`;
/// the prefix is None when `at` was the head.
///
/// Elements of the suffix keep their parent until they are spliced
/// elsewhere.
pub fn split<A: RingArena + ?Sized>(
    arena: &mut A,
    ring: NodeId,
    at: NodeId,
) -> Result<(Option<NodeId>, NodeId)> {
    let owner = arena.links(ring).parent;
    if owner.is_none() || arena.links(at).parent != owner {
        return Err(Error::NotInRing {
            node: at,
            parent: owner.unwrap_or(ring),
        });
    }
    if at == ring {
        return Ok((None, ring));
    }

    let tail = arena.links(ring).prev;
    let before = arena.links(at).prev;
    arena.links_mut(before).next = ring;
    arena.links_mut(ring).prev = before;
    arena.links_mut(tail).next = at;
    arena.links_mut(at).prev = tail;
    Ok((Some(ring), at))
}

/// Append the whole ring headed by `suffix` at the tail of `new_parent`'s
/// ring (head `ring`), reparenting every moved element. Returns the head
/// and the number of elements moved.
pub fn splice<A: RingArena + ?Sized>(
    arena: &mut A,
    suffix: NodeId,
    new_parent: NodeId,
    ring: Option<NodeId>,
) -> (NodeId, usize) {
    let mut moved = 0;
    let mut cur = suffix;
    loop {
        let links = arena.links_mut(cur);
        links.parent = Some(new_parent);
        moved += 1;
        cur = links.next;
        if cur == suffix {
            break;
        }
    }

    let Some(head) = ring else {
        return (suffix, moved);
    };
    let tail = arena.links(head).prev;
    let suffix_tail = arena.links(suffix).prev;
    arena.links_mut(tail).next = suffix;
    arena.links_mut(suffix).prev = tail;
    arena.links_mut(suffix_tail).next = head;
    arena.links_mut(head).prev = suffix_tail;
    (head, moved)
}

/// Iterator over the members of a ring, head first
pub struct Members<'a, A: RingArena + ?Sized> {
    arena: &'a A,
    head: Option<NodeId>,
    next: Option<NodeId>,
}

impl<'a, A: RingArena + ?Sized> Members<'a, A> {
    pub fn new(arena: &'a A, head: Option<NodeId>) -> Self {
        Members {
            arena,
            head,
            next: head,
        }
    }
}

impl<A: RingArena + ?Sized> Iterator for Members<'_, A> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        let following = self.arena.links(current).next;
        self.next = (Some(following) != self.head).then_some(following);
        Some(current)
    }
}

/// Ring traversal that survives modification of the ring.
///
/// The cursor captures the ring's tail on its first step and stops after
/// returning it. If the last element it returned has since left the
/// owner's ring, iteration restarts from the current head, so elements may
/// be seen more than once but none is skipped. An element moved within the
/// ring (even to the tail) continues at the successor it had when it was
/// returned.
#[derive(Debug, Clone, Copy)]
pub struct RingCursor {
    owner: NodeId,
    last: Option<NodeId>,
    /// Next element of `last` when it was returned; None if it was the tail
    successor: Option<NodeId>,
    /// Tail of the ring at the first step
    end: Option<NodeId>,
    done: bool,
}

impl RingCursor {
    pub fn new(owner: NodeId) -> Self {
        RingCursor {
            owner,
            last: None,
            successor: None,
            end: None,
            done: false,
        }
    }

    /// The ring owner
    #[inline]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Advance, given the owner's current ring head
    pub fn advance<A: RingArena + ?Sized>(&mut self, arena: &A, head: Option<NodeId>) -> Option<NodeId> {
        if self.done {
            return None;
        }
        let owner = Some(self.owner);
        let owned = |id: NodeId| arena.links(id).parent == owner;

        let next = match self.last {
            None => {
                self.end = head.map(|head| arena.links(head).prev);
                head
            }
            // the last element was moved away
            Some(last) if !owned(last) => head,
            Some(_) if self.successor.is_some_and(owned) => self.successor,
            Some(last) => {
                let next = arena.links(last).next;
                (Some(next) != head).then_some(next)
            }
        };

        let Some(id) = next else {
            self.done = true;
            return None;
        };
        let following = arena.links(id).next;
        self.last = Some(id);
        self.successor = (Some(following) != head).then_some(following);
        self.done = Some(id) == self.end;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Plain arena of links; element 0 owns rings in these tests
    struct Arena(Vec<Links>);

    impl Arena {
        fn new(n: u32) -> Self {
            Arena((0..n).map(Links::detached).collect())
        }
    }

    impl RingArena for Arena {
        fn links(&self, id: NodeId) -> &Links {
            &self.0[id as usize]
        }
        fn links_mut(&mut self, id: NodeId) -> &mut Links {
            &mut self.0[id as usize]
        }
    }

    fn ring_of(arena: &mut Arena, parent: NodeId, ids: &[NodeId]) -> Option<NodeId> {
        let mut head = None;
        for &id in ids {
            head = Some(attach(arena, id, parent, head).unwrap());
        }
        head
    }

    fn members(arena: &Arena, head: Option<NodeId>) -> Vec<NodeId> {
        Members::new(arena, head).collect()
    }

    fn backwards(arena: &Arena, head: NodeId) -> Vec<NodeId> {
        let mut out = vec![];
        let mut cur = arena.links(head).prev;
        loop {
            out.push(cur);
            if cur == head {
                break;
            }
            cur = arena.links(cur).prev;
        }
        out
    }

    #[test]
    fn test_attach_preserves_order_both_ways() {
        let mut arena = Arena::new(5);
        let head = ring_of(&mut arena, 0, &[1, 2, 3, 4]);
        assert_eq!(head, Some(1));
        assert_eq!(members(&arena, head), vec![1, 2, 3, 4]);
        assert_eq!(backwards(&arena, 1), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_attach_rejects_attached_element() {
        let mut arena = Arena::new(3);
        let head = ring_of(&mut arena, 0, &[1, 2]);
        assert!(matches!(attach(&mut arena, 2, 0, head), Err(Error::AlreadyAttached(2))));
    }

    #[test]
    fn test_detach_head_middle_and_last() {
        let mut arena = Arena::new(4);
        let head = ring_of(&mut arena, 0, &[1, 2, 3]).unwrap();

        let head = detach(&mut arena, 2, 0, head).unwrap().unwrap();
        assert_eq!(members(&arena, Some(head)), vec![1, 3]);
        assert_eq!(*arena.links(2), Links::detached(2));

        let head = detach(&mut arena, 1, 0, head).unwrap();
        assert_eq!(head, Some(3));
        assert_eq!(detach(&mut arena, 3, 0, 3).unwrap(), None);
    }

    #[test]
    fn test_detach_foreign_element() {
        let mut arena = Arena::new(3);
        let head = ring_of(&mut arena, 0, &[1]).unwrap();
        assert!(matches!(
            detach(&mut arena, 2, 0, head),
            Err(Error::NotInRing { node: 2, parent: 0 })
        ));
    }

    #[test]
    fn test_split_and_splice() {
        let mut arena = Arena::new(8);
        let head = ring_of(&mut arena, 0, &[1, 2, 3, 4]).unwrap();
        let other = ring_of(&mut arena, 5, &[6, 7]);

        let (prefix, suffix) = split(&mut arena, head, 3).unwrap();
        assert_eq!(members(&arena, prefix), vec![1, 2]);
        assert_eq!(members(&arena, Some(suffix)), vec![3, 4]);

        let (head, moved) = splice(&mut arena, suffix, 5, other);
        assert_eq!(moved, 2);
        assert_eq!(members(&arena, Some(head)), vec![6, 7, 3, 4]);
        assert_eq!(backwards(&arena, head), vec![4, 3, 7, 6]);
        assert_eq!(arena.links(4).parent, Some(5));
    }

    #[test]
    fn test_split_at_head_moves_everything() {
        let mut arena = Arena::new(4);
        let head = ring_of(&mut arena, 0, &[1, 2]).unwrap();
        let (prefix, suffix) = split(&mut arena, head, 1).unwrap();
        assert_eq!(prefix, None);

        let (head, _) = splice(&mut arena, suffix, 3, None);
        assert_eq!(members(&arena, Some(head)), vec![1, 2]);
        assert_eq!(arena.links(2).parent, Some(3));
    }

    #[test]
    fn test_cursor_restarts_after_removal() {
        let mut arena = Arena::new(5);
        let mut head = ring_of(&mut arena, 0, &[1, 2, 3, 4]);
        let mut cursor = RingCursor::new(0);

        assert_eq!(cursor.advance(&arena, head), Some(1));
        assert_eq!(cursor.advance(&arena, head), Some(2));
        head = detach(&mut arena, 2, 0, head.unwrap()).unwrap();
        // 2 left the ring: restart from the head, nothing is skipped
        assert_eq!(cursor.advance(&arena, head), Some(1));
        assert_eq!(cursor.advance(&arena, head), Some(3));
        assert_eq!(cursor.advance(&arena, head), Some(4));
        assert_eq!(cursor.advance(&arena, head), None);
        assert_eq!(cursor.advance(&arena, head), None);
    }

    #[test]
    fn test_cursor_moving_each_element_to_tail() {
        let mut arena = Arena::new(4);
        let mut head = ring_of(&mut arena, 0, &[1, 2, 3]);
        let mut cursor = RingCursor::new(0);
        let mut seen = vec![];

        while let Some(id) = cursor.advance(&arena, head) {
            seen.push(id);
            head = detach(&mut arena, id, 0, head.unwrap()).unwrap();
            head = Some(attach(&mut arena, id, 0, head).unwrap());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(members(&arena, head), vec![1, 2, 3]);
    }

    #[test]
    fn test_cursor_stops_at_first_tail() {
        let mut arena = Arena::new(4);
        let mut head = ring_of(&mut arena, 0, &[1]);
        let mut cursor = RingCursor::new(0);
        assert_eq!(cursor.advance(&arena, head), Some(1));
        head = Some(attach(&mut arena, 2, 0, head).unwrap());
        assert_eq!(members(&arena, head), vec![1, 2]);
        assert_eq!(cursor.advance(&arena, head), None);
    }

    #[test]
    fn test_cursor_over_empty_ring() {
        let arena = Arena::new(1);
        let mut cursor = RingCursor::new(0);
        assert_eq!(cursor.advance(&arena, None), None);
    }
}
