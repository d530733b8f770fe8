//! Container bookkeeping shared by every concrete generator.

use crate::error::EncodeCause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    /// Members written so far (fields for objects, items for arrays).
    count: usize,
    pending_field: bool,
}

/// Where the next value lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// A root value; the index counts previous root values.
    Root(usize),
    /// An array item; the index is its position.
    Item(usize),
    /// The value of the field name written just before.
    Field,
}

/// Validates the writer call sequence: balanced containers, one value per
/// field name, and no writes after the payload was taken.
#[derive(Debug, Default)]
pub(crate) struct Nesting {
    stack: Vec<Frame>,
    roots: usize,
    finished: bool,
}

impl Nesting {
    fn check_open(&self) -> Result<(), EncodeCause> {
        if self.finished {
            Err(EncodeCause::WriterFinished)
        } else {
            Ok(())
        }
    }

    /// Registers a field name; returns the index of the field in its object.
    pub fn field_name(&mut self) -> Result<usize, EncodeCause> {
        self.check_open()?;
        match self.stack.last_mut() {
            Some(frame) if frame.kind == FrameKind::Object => {
                if frame.pending_field {
                    return Err(EncodeCause::UnexpectedFieldName);
                }
                frame.pending_field = true;
                let index = frame.count;
                frame.count += 1;
                Ok(index)
            }
            _ => Err(EncodeCause::FieldNameOutsideObject),
        }
    }

    /// Registers a value (scalar or container start).
    pub fn value(&mut self) -> Result<Slot, EncodeCause> {
        self.check_open()?;
        match self.stack.last_mut() {
            None => {
                let index = self.roots;
                self.roots += 1;
                Ok(Slot::Root(index))
            }
            Some(frame) if frame.kind == FrameKind::Array => {
                let index = frame.count;
                frame.count += 1;
                Ok(Slot::Item(index))
            }
            Some(frame) => {
                if !frame.pending_field {
                    return Err(EncodeCause::MissingFieldName);
                }
                frame.pending_field = false;
                Ok(Slot::Field)
            }
        }
    }

    pub fn start_object(&mut self) -> Result<Slot, EncodeCause> {
        self.start(FrameKind::Object)
    }

    pub fn start_array(&mut self) -> Result<Slot, EncodeCause> {
        self.start(FrameKind::Array)
    }

    fn start(&mut self, kind: FrameKind) -> Result<Slot, EncodeCause> {
        let slot = self.value()?;
        self.stack.push(Frame {
            kind,
            count: 0,
            pending_field: false,
        });
        Ok(slot)
    }

    pub fn end_object(&mut self) -> Result<(), EncodeCause> {
        self.end(FrameKind::Object)
    }

    pub fn end_array(&mut self) -> Result<(), EncodeCause> {
        self.end(FrameKind::Array)
    }

    fn end(&mut self, kind: FrameKind) -> Result<(), EncodeCause> {
        self.check_open()?;
        match self.stack.last() {
            Some(frame) if frame.kind == kind && !frame.pending_field => {
                self.stack.pop();
                Ok(())
            }
            _ => Err(EncodeCause::MismatchedEnd),
        }
    }

    /// Closes the writer; every later call fails with `WriterFinished`.
    pub fn finish(&mut self) -> Result<(), EncodeCause> {
        self.check_open()?;
        if !self.stack.is_empty() {
            return Err(EncodeCause::UnbalancedContainers(self.stack.len()));
        }
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_slots() {
        let mut nesting = Nesting::default();
        assert_eq!(nesting.start_object().unwrap(), Slot::Root(0));
        assert_eq!(nesting.field_name().unwrap(), 0);
        assert_eq!(nesting.start_array().unwrap(), Slot::Field);
        assert_eq!(nesting.value().unwrap(), Slot::Item(0));
        assert_eq!(nesting.value().unwrap(), Slot::Item(1));
        nesting.end_array().unwrap();
        assert_eq!(nesting.field_name().unwrap(), 1);
        assert_eq!(nesting.value().unwrap(), Slot::Field);
        nesting.end_object().unwrap();
        nesting.finish().unwrap();
        assert!(matches!(nesting.value(), Err(EncodeCause::WriterFinished)));
    }

    #[test]
    fn rejects_misuse() {
        let mut nesting = Nesting::default();
        assert!(matches!(
            nesting.field_name(),
            Err(EncodeCause::FieldNameOutsideObject)
        ));
        nesting.start_object().unwrap();
        assert!(matches!(nesting.value(), Err(EncodeCause::MissingFieldName)));
        nesting.field_name().unwrap();
        assert!(matches!(
            nesting.field_name(),
            Err(EncodeCause::UnexpectedFieldName)
        ));
        assert!(matches!(nesting.end_object(), Err(EncodeCause::MismatchedEnd)));
        nesting.value().unwrap();
        assert!(matches!(nesting.end_array(), Err(EncodeCause::MismatchedEnd)));
        assert!(matches!(
            nesting.finish(),
            Err(EncodeCause::UnbalancedContainers(1))
        ));
    }
}
