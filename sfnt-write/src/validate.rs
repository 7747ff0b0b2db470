//! Checking tables before they are compiled

use std::{
    collections::BTreeSet,
    fmt::{Debug, Display, Write},
};

use crate::offsets::{NullableOffsetMarker, OffsetMarker};

/// Constraints a table must meet before it can be written.
///
/// Some rules, like two arrays having the same length or a count fitting in
/// a `u16`, don't fit in the type system. Tables check them here instead,
/// and every problem found is collected into a [`ValidationReport`].
pub trait Validate {
    /// Check this table and everything below it.
    fn validate(&self) -> Result<(), ValidationReport> {
        let mut ctx = ValidationCtx::default();
        self.validate_impl(&mut ctx);
        ctx.finish()
    }

    /// Report any problems with this table to `ctx`.
    ///
    /// Implementations name themselves and their fields so that errors can
    /// be located:
    ///
    /// ```rust
    /// # use sfnt_write::validate::{Validate, ValidationCtx};
    /// struct Widths(Vec<u16>);
    ///
    /// impl Validate for Widths {
    ///     fn validate_impl(&self, ctx: &mut ValidationCtx) {
    ///         ctx.in_table("Widths", |ctx| {
    ///             ctx.in_field("values", |ctx| {
    ///                 if self.0.len() > u16::MAX as usize {
    ///                     ctx.report("too many widths");
    ///                 }
    ///             })
    ///         })
    ///     }
    /// }
    /// ```
    fn validate_impl(&self, ctx: &mut ValidationCtx);
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Table(&'static str),
    Field(&'static str),
    Item(usize),
}

/// Collects errors, along with where in the table tree each was found.
#[derive(Clone, Debug, Default)]
pub struct ValidationCtx {
    path: Vec<Step>,
    errors: Vec<ValidationError>,
}

#[derive(Clone, Debug)]
struct ValidationError {
    location: String,
    message: String,
}

/// Every problem found while validating a table.
#[derive(Clone)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationCtx {
    /// Errors reported by `f` are located inside the table `name`.
    pub fn in_table(&mut self, name: &'static str, f: impl FnOnce(&mut ValidationCtx)) {
        self.scoped(Step::Table(name), f);
    }

    /// Errors reported by `f` are located at the field `name`.
    pub fn in_field(&mut self, name: &'static str, f: impl FnOnce(&mut ValidationCtx)) {
        self.scoped(Step::Field(name), f);
    }

    /// Start an array; `f` should call [`array_item`](Self::array_item) once
    /// per element.
    pub fn in_array(&mut self, f: impl FnOnce(&mut ValidationCtx)) {
        self.scoped(Step::Item(0), f);
    }

    /// Validate the next element of the enclosing array.
    pub fn array_item(&mut self, f: impl FnOnce(&mut ValidationCtx)) {
        f(self);
        if let Some(Step::Item(index)) = self.path.last_mut() {
            *index += 1;
        }
    }

    /// Record an error at the current location.
    pub fn report(&mut self, message: impl Display) {
        self.errors.push(ValidationError {
            location: self.location(),
            message: message.to_string(),
        });
    }

    fn scoped(&mut self, step: Step, f: impl FnOnce(&mut ValidationCtx)) {
        self.path.push(step);
        f(self);
        self.path.pop();
    }

    /// The current path, like `Gpos.lookup_list > Lookup.subtables[2]`.
    fn location(&self) -> String {
        let mut out = String::new();
        for step in &self.path {
            // writing to a String can't fail
            let _ = match step {
                Step::Table(name) if out.is_empty() => write!(out, "{name}"),
                Step::Table(name) => write!(out, " > {name}"),
                Step::Field(name) => write!(out, ".{name}"),
                Step::Item(index) => write!(out, "[{index}]"),
            };
        }
        out
    }

    fn finish(self) -> Result<(), ValidationReport> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport {
                errors: self.errors,
            })
        }
    }
}

impl ValidationReport {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.errors.len() {
            1 => writeln!(f, "table failed validation:")?,
            n => writeln!(f, "table failed validation with {n} errors:")?,
        }
        for error in &self.errors {
            writeln!(f, "  {}: {}", error.location, error.message)?;
        }
        Ok(())
    }
}

impl Debug for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for ValidationReport {}

fn validate_items<'a, T: Validate + 'a>(
    items: impl IntoIterator<Item = &'a T>,
    ctx: &mut ValidationCtx,
) {
    ctx.in_array(|ctx| {
        for item in items {
            ctx.array_item(|ctx| item.validate_impl(ctx));
        }
    });
}

impl<T: Validate> Validate for Vec<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        validate_items(self, ctx);
    }
}

impl<T: Validate> Validate for BTreeSet<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        validate_items(self, ctx);
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if let Some(inner) = self {
            inner.validate_impl(ctx);
        }
    }
}

impl<const N: usize, T: Validate> Validate for OffsetMarker<T, N> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        match self.get() {
            Some(obj) => obj.validate_impl(ctx),
            None => ctx.report("required offset is null"),
        }
    }
}

impl<const N: usize, T: Validate> Validate for NullableOffsetMarker<T, N> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if let Some(obj) = self.get() {
            obj.validate_impl(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Counts {
        values: Vec<u16>,
        children: Vec<Child>,
    }

    struct Child(bool);

    impl Validate for Child {
        fn validate_impl(&self, ctx: &mut ValidationCtx) {
            ctx.in_table("Child", |ctx| {
                if !self.0 {
                    ctx.report("child is bad");
                }
            })
        }
    }

    impl Validate for Counts {
        fn validate_impl(&self, ctx: &mut ValidationCtx) {
            ctx.in_table("Counts", |ctx| {
                ctx.in_field("values", |ctx| {
                    if self.values.len() > 2 {
                        ctx.report("too many values");
                    }
                });
                ctx.in_field("children", |ctx| self.children.validate_impl(ctx));
            })
        }
    }

    #[test]
    fn errors_carry_their_path() {
        let table = Counts {
            values: vec![1, 2, 3],
            children: vec![Child(true), Child(false), Child(false)],
        };
        let report = table.validate().unwrap_err();
        assert_eq!(report.len(), 3);
        assert_eq!(
            report.to_string(),
            "table failed validation with 3 errors:\n  \
             Counts.values: too many values\n  \
             Counts.children[1] > Child: child is bad\n  \
             Counts.children[2] > Child: child is bad\n"
        );
    }

    #[test]
    fn single_error_report() {
        let table = Counts {
            values: vec![],
            children: vec![Child(false)],
        };
        let report = table.validate().unwrap_err();
        assert_eq!(
            report.to_string(),
            "table failed validation:\n  Counts.children[0] > Child: child is bad\n"
        );
    }

    #[test]
    fn null_required_offset_is_reported() {
        let marker: OffsetMarker<Child> = Default::default();
        assert!(marker.validate().is_err());
        let marker: NullableOffsetMarker<Child> = Default::default();
        assert!(marker.validate().is_ok());
    }
}
