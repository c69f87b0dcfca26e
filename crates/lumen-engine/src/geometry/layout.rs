use crate::error::{Error, Result};

const F32_SIZE: u32 = std::mem::size_of::<f32>() as u32;

/// One `f32` vertex attribute inside an interleaved vertex.
///
/// `stride` and `offset` are in bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub stride: u32,
    pub offset: u32,
}

impl VertexAttribute {
    /// Bytes occupied by this attribute within one vertex.
    pub fn span(&self) -> u32 {
        self.components * F32_SIZE
    }

    pub(crate) fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// Interleaved layout of one vertex buffer.
///
/// Attributes are kept in offset order and always satisfy [`VertexLayout::validate`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Builds a layout from explicit attributes (any order).
    pub fn new(mut attributes: Vec<VertexAttribute>) -> Result<Self> {
        attributes.sort_by_key(|a| a.offset);
        let layout = Self { attributes };
        layout.validate()?;
        Ok(layout)
    }

    /// Builds a tightly packed layout from `(location, components)` pairs.
    ///
    /// `packed(&[(0, 3), (1, 3)])` is a position + color vertex of 24 bytes.
    pub fn packed(attributes: &[(u32, u32)]) -> Result<Self> {
        let stride = attributes.iter().map(|(_, c)| c * F32_SIZE).sum();
        let mut offset = 0;
        let attributes = attributes
            .iter()
            .map(|&(location, components)| {
                let attr = VertexAttribute { location, components, stride, offset };
                offset += attr.span();
                attr
            })
            .collect();
        Self::new(attributes)
    }

    /// Checks the layout invariants.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.attributes.first() else {
            return Err(Error::layout("vertex layout has no attributes"));
        };
        let stride = first.stride;

        let mut end = 0;
        for (i, attr) in self.attributes.iter().enumerate() {
            if !(1..=4).contains(&attr.components) {
                return Err(Error::layout(format!(
                    "attribute at location {} has {} components; 1 to 4 are supported",
                    attr.location, attr.components
                )));
            }
            if attr.stride != stride {
                return Err(Error::layout(format!(
                    "attribute at location {} has stride {}, expected {stride}",
                    attr.location, attr.stride
                )));
            }
            if attr.offset % F32_SIZE != 0 {
                return Err(Error::layout(format!(
                    "attribute at location {} has unaligned offset {}",
                    attr.location, attr.offset
                )));
            }
            if attr.offset < end {
                return Err(Error::layout(format!(
                    "attribute at location {} (offset {}) overlaps the previous attribute",
                    attr.location, attr.offset
                )));
            }
            if self.attributes[..i].iter().any(|a| a.location == attr.location) {
                return Err(Error::layout(format!(
                    "location {} is used by more than one attribute",
                    attr.location
                )));
            }
            end = attr.offset + attr.span();
        }

        let spans: u32 = self.attributes.iter().map(VertexAttribute::span).sum();
        if spans != stride || end > stride {
            return Err(Error::layout(format!(
                "attribute spans sum to {spans} bytes but the stride is {stride}"
            )));
        }
        Ok(())
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u32 {
        self.attributes[0].stride
    }

    pub fn floats_per_vertex(&self) -> usize {
        (self.stride() / F32_SIZE) as usize
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, location: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.location == location)
    }

    pub(crate) fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format(),
                offset: a.offset as u64,
                shader_location: a.location,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attr(location: u32, components: u32, stride: u32, offset: u32) -> VertexAttribute {
        VertexAttribute { location, components, stride, offset }
    }

    fn is_mismatch(r: Result<VertexLayout>) -> bool {
        matches!(r, Err(Error::LayoutMismatch { .. }))
    }

    // ── builders ──────────────────────────────────────────────────────────

    #[test]
    fn packed_computes_offsets_and_stride() {
        let layout = VertexLayout::packed(&[(0, 3), (1, 3), (2, 2)]).unwrap();
        assert_eq!(layout.stride(), 32);
        assert_eq!(layout.floats_per_vertex(), 8);
        let offsets: Vec<_> = layout.attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, [0, 12, 24]);
    }

    #[test]
    fn new_sorts_by_offset() {
        let layout = VertexLayout::new(vec![attr(1, 3, 24, 12), attr(0, 3, 24, 0)]).unwrap();
        assert_eq!(layout.attributes()[0].location, 0);
        assert_eq!(layout.attribute(1).map(|a| a.offset), Some(12));
        assert_eq!(layout.attribute(7), None);
    }

    #[test]
    fn wgpu_formats_follow_component_count() {
        let layout = VertexLayout::packed(&[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        let formats: Vec<_> = layout.wgpu_attributes().iter().map(|a| a.format).collect();
        assert_eq!(
            formats,
            [
                wgpu::VertexFormat::Float32,
                wgpu::VertexFormat::Float32x2,
                wgpu::VertexFormat::Float32x3,
                wgpu::VertexFormat::Float32x4,
            ]
        );
    }

    // ── invariants ────────────────────────────────────────────────────────

    #[test]
    fn empty_layout_is_rejected() {
        assert!(is_mismatch(VertexLayout::new(Vec::new())));
    }

    #[test]
    fn component_count_out_of_range() {
        assert!(is_mismatch(VertexLayout::packed(&[(0, 0)])));
        assert!(is_mismatch(VertexLayout::packed(&[(0, 5)])));
    }

    #[test]
    fn duplicate_location() {
        assert!(is_mismatch(VertexLayout::packed(&[(0, 3), (0, 3)])));
    }

    #[test]
    fn unequal_strides() {
        assert!(is_mismatch(VertexLayout::new(vec![attr(0, 3, 24, 0), attr(1, 3, 28, 12)])));
    }

    #[test]
    fn overlapping_offsets() {
        assert!(is_mismatch(VertexLayout::new(vec![attr(0, 3, 24, 0), attr(1, 3, 24, 8)])));
    }

    #[test]
    fn spans_must_fill_stride() {
        // 12 bytes of data in a 16-byte vertex.
        assert!(is_mismatch(VertexLayout::new(vec![attr(0, 3, 16, 0)])));
        // Gap between attributes.
        assert!(is_mismatch(VertexLayout::new(vec![attr(0, 2, 24, 0), attr(1, 3, 24, 12)])));
    }
}
