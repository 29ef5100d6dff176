//! Runtime-negotiated vertex layout.
//!
//! Modifiers declare which per-particle attributes they need through a
//! [`VertexComponents`] bitmask. The system merges those masks into one
//! [`VertexFormat`] whose float stride is a deterministic function of the
//! mask and identical for every particle in a frame. The layout is rebuilt
//! only when the mask changes, never per particle.
//!
//! Attribute order is canonical and fixed:
//! `offset`, `position`, then the optional components in declaration order
//! below. `offset` (the 2-float quad corner) and `position` (3 floats) are
//! always present, so the minimum stride is 5 floats.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask of optional per-particle vertex attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexComponents(u32);

impl VertexComponents {
    /// No optional components; the default format.
    pub const DEFAULT: Self = Self(0);
    /// Per-particle size, 1 float.
    pub const SIZE: Self = Self(1 << 0);
    /// Per-particle RGB color, 3 floats.
    pub const COLOR: Self = Self(1 << 1);
    /// Normalized age (`time_lived / lifetime`), 1 float.
    pub const TIME: Self = Self(1 << 2);
    /// Previous-step position, 3 floats.
    pub const OLD_POSITION: Self = Self(1 << 3);
    /// Rotation angle, 1 float.
    pub const ROTATION: Self = Self(1 << 4);
    /// Sprite sheet index, 1 float.
    pub const SPRITE_INDEX: Self = Self(1 << 5);

    /// Whether every bit of `other` is set in `self`.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no optional component is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for VertexComponents {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for VertexComponents {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for VertexComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in [
            (Self::SIZE, "size"),
            (Self::COLOR, "color"),
            (Self::TIME, "time"),
            (Self::OLD_POSITION, "old_position"),
            (Self::ROTATION, "rotation"),
            (Self::SPRITE_INDEX, "sprite_index"),
        ] {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        if first {
            write!(f, "default")?;
        }
        Ok(())
    }
}

/// One attribute of the packed vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader-facing attribute name.
    pub name: &'static str,
    /// Component count in floats.
    pub size: usize,
    /// Offset from the vertex start, in floats.
    pub offset: usize,
}

/// The negotiated vertex layout for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexFormat {
    components: VertexComponents,
    attributes: Vec<VertexAttribute>,
    vertex_size: usize,
}

impl VertexFormat {
    /// The default format: quad corner offset + position, stride 5.
    pub fn new() -> Self {
        let mut format = Self {
            components: VertexComponents::DEFAULT,
            attributes: Vec::new(),
            vertex_size: 0,
        };
        format.rebuild();
        format
    }

    /// Active component mask.
    #[inline]
    pub fn components(&self) -> VertexComponents {
        self.components
    }

    /// Float stride of one packed vertex.
    #[inline]
    pub fn vertex_size(&self) -> usize {
        self.vertex_size
    }

    /// The attribute layout, in canonical order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Merge additional components into the format.
    ///
    /// Returns `true` when the mask actually grew and the layout was
    /// rebuilt. A merge that leaves the mask unchanged is a no-op, so the
    /// caller can skip the buffer reallocation.
    pub fn add_components(&mut self, components: VertexComponents) -> bool {
        if self.components.contains(components) {
            return false;
        }
        self.components |= components;
        self.rebuild();
        true
    }

    /// Reset to the default mask and rebuild.
    pub fn reset(&mut self) {
        self.components = VertexComponents::DEFAULT;
        self.rebuild();
    }

    /// Recompute attribute offsets for the current mask.
    fn rebuild(&mut self) {
        self.attributes.clear();
        self.attributes.push(VertexAttribute {
            name: "offset",
            size: 2,
            offset: 0,
        });
        self.attributes.push(VertexAttribute {
            name: "position",
            size: 3,
            offset: 2,
        });

        let mut cursor = 5;
        for (flag, name, size) in [
            (VertexComponents::SIZE, "size", 1),
            (VertexComponents::COLOR, "color", 3),
            (VertexComponents::TIME, "time", 1),
            (VertexComponents::OLD_POSITION, "old_position", 3),
            (VertexComponents::ROTATION, "rotation", 1),
            (VertexComponents::SPRITE_INDEX, "sprite_index", 1),
        ] {
            if self.components.contains(flag) {
                self.attributes.push(VertexAttribute {
                    name,
                    size,
                    offset: cursor,
                });
                cursor += size;
            }
        }
        self.vertex_size = cursor;
    }
}

impl Default for VertexFormat {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_stride() {
        let format = VertexFormat::new();
        assert_eq!(format.vertex_size(), 5);
        assert_eq!(format.attributes().len(), 2);
        assert_eq!(format.attributes()[0].name, "offset");
        assert_eq!(format.attributes()[1].offset, 2);
    }

    #[test]
    fn test_stride_is_function_of_mask() {
        let mut format = VertexFormat::new();
        format.add_components(VertexComponents::COLOR | VertexComponents::TIME);
        // 5 base + 3 color + 1 time
        assert_eq!(format.vertex_size(), 9);

        let mut other = VertexFormat::new();
        other.add_components(VertexComponents::TIME);
        other.add_components(VertexComponents::COLOR);
        assert_eq!(format, other);
    }

    #[test]
    fn test_add_components_idempotent() {
        let mut format = VertexFormat::new();
        assert!(format.add_components(VertexComponents::SIZE | VertexComponents::ROTATION));
        let snapshot = format.clone();

        // Second merge of the same mask must change nothing.
        assert!(!format.add_components(VertexComponents::SIZE | VertexComponents::ROTATION));
        assert_eq!(format, snapshot);
    }

    #[test]
    fn test_subset_merge_is_noop_but_superset_is_not() {
        let mut format = VertexFormat::new();
        format.add_components(VertexComponents::COLOR);
        assert!(!format.add_components(VertexComponents::COLOR));
        // Overlapping but larger mask must still rebuild.
        assert!(format.add_components(VertexComponents::COLOR | VertexComponents::SIZE));
        assert!(format.components().contains(VertexComponents::SIZE));
    }

    #[test]
    fn test_canonical_order_offsets() {
        let mut format = VertexFormat::new();
        format.add_components(
            VertexComponents::SIZE
                | VertexComponents::COLOR
                | VertexComponents::TIME
                | VertexComponents::OLD_POSITION
                | VertexComponents::ROTATION
                | VertexComponents::SPRITE_INDEX,
        );
        let offsets: Vec<(&str, usize)> = format
            .attributes()
            .iter()
            .map(|a| (a.name, a.offset))
            .collect();
        assert_eq!(
            offsets,
            vec![
                ("offset", 0),
                ("position", 2),
                ("size", 5),
                ("color", 6),
                ("time", 9),
                ("old_position", 10),
                ("rotation", 13),
                ("sprite_index", 14),
            ]
        );
        assert_eq!(format.vertex_size(), 15);
    }

    #[test]
    fn test_reset_restores_default() {
        let mut format = VertexFormat::new();
        format.add_components(VertexComponents::COLOR);
        format.reset();
        assert_eq!(format.components(), VertexComponents::DEFAULT);
        assert_eq!(format.vertex_size(), 5);
    }

    #[test]
    fn test_display() {
        let mask = VertexComponents::COLOR | VertexComponents::TIME;
        assert_eq!(mask.to_string(), "color|time");
        assert_eq!(VertexComponents::DEFAULT.to_string(), "default");
    }
}
