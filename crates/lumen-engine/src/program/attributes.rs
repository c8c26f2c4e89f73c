use crate::gfx::GraphicsContext;

use super::{LinkedProgram, ProgramError};

/// Attribute name → binding slot, resolved once per linked program.
///
/// Every entry holds a valid slot; a table is only constructed when all
/// requested names resolve.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct AttributeLocationTable {
    slots: Vec<(String, u32)>,
}

impl AttributeLocationTable {
    /// Resolves every name in `names` against `program`.
    ///
    /// The first name without a location fails the whole resolution with
    /// [`ProgramError::AttributeResolution`].
    pub fn resolve<C: GraphicsContext + ?Sized>(
        ctx: &C,
        program: &LinkedProgram,
        names: &[&str],
    ) -> Result<Self, ProgramError> {
        let mut slots = Vec::with_capacity(names.len());
        for name in names {
            let Some(slot) = ctx.attribute_location(program.id(), name) else {
                log::error!("attribute `{name}` not found in {}", program.id());
                return Err(ProgramError::AttributeResolution((*name).to_string()));
            };
            log::debug!("attribute `{name}` bound to slot {slot}");
            slots.push(((*name).to_string(), slot));
        }
        Ok(Self { slots })
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.slots.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::RecordingContext;
    use crate::program::build_program;
    use crate::program::test_sources::{FRAGMENT, VERTEX};

    #[test]
    fn resolves_declared_attribute() {
        let mut ctx = RecordingContext::new();
        let program = build_program(&mut ctx, VERTEX, FRAGMENT).unwrap();
        let table = AttributeLocationTable::resolve(&ctx, &program, &["vertexPosition"]).unwrap();
        assert_eq!(table.get("vertexPosition"), Some(0));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_attribute_is_named_in_the_error() {
        let mut ctx = RecordingContext::new();
        let program = build_program(&mut ctx, VERTEX, FRAGMENT).unwrap();
        let err =
            AttributeLocationTable::resolve(&ctx, &program, &["vertexPosition", "vertexNormal"])
                .unwrap_err();
        assert_eq!(err, ProgramError::AttributeResolution("vertexNormal".into()));
    }
}
