//! Singly-linked list kept in non-decreasing byte order.
//!
//! The list does no locking of its own. Mutation takes `&mut self`; when the
//! list is shared between workers that exclusive borrow comes from
//! [`Gate`](crate::gate::Gate).

use std::iter::FusedIterator;

use crate::record::StringRecord;

/// One record plus the link to its successor.
#[derive(Debug)]
pub struct ListNode {
  record: StringRecord,
  next: Option<Box<ListNode>>,
}

impl ListNode {
  pub fn new(record: StringRecord) -> Box<Self> {
    Box::new(Self { record, next: None })
  }
}

#[derive(Debug, Default)]
pub struct SortedList {
  head: Option<Box<ListNode>>,
  len: usize,
}

impl SortedList {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_none()
  }

  pub fn insert(&mut self, record: StringRecord) {
    self.insert_node(ListNode::new(record));
  }

  /// Link `node` in after every record that compares less than or equal to it.
  pub fn insert_node(&mut self, mut node: Box<ListNode>) {
    let mut cursor = &mut self.head;
    while cursor.as_ref().is_some_and(|next| next.record <= node.record) {
      match cursor {
        Some(next) => cursor = &mut next.next,
        None => break,
      }
    }
    node.next = cursor.take();
    *cursor = Some(node);
    self.len += 1;
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      next: self.head.as_deref(),
      remaining: self.len,
    }
  }

  /// Check that every adjacent pair is in order.
  pub fn is_sorted(&self) -> bool {
    let mut records = self.iter();
    let Some(mut previous) = records.next() else {
      return true;
    };
    for record in records {
      if previous > record {
        return false;
      }
      previous = record;
    }
    true
  }
}

// Unlink node by node; the default drop would recurse once per node.
impl Drop for SortedList {
  fn drop(&mut self) {
    let mut next = self.head.take();
    while let Some(mut node) = next {
      next = node.next.take();
    }
  }
}

impl<'a> IntoIterator for &'a SortedList {
  type Item = &'a StringRecord;
  type IntoIter = Iter<'a>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

/// Front-to-back traversal of a [`SortedList`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
  next: Option<&'a ListNode>,
  remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
  type Item = &'a StringRecord;

  fn next(&mut self) -> Option<Self::Item> {
    let node = self.next?;
    self.next = node.next.as_deref();
    self.remaining -= 1;
    Some(&node.record)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
