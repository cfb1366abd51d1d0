//! Conversion from resolved node styles to Taffy solver settings.

use taffy::prelude::*;

use crate::node_style::{
    AlignItems as GAlign, BorderKind, Dim, FlexDirection as GFlexDirection,
    JustifyContent as GJustify, PositionKind, ResolvedStyle,
};

/// Translate a resolved style into a Taffy style.
pub fn resolved_to_taffy(resolved: &ResolvedStyle) -> Style {
    let border_width = if resolved.border == BorderKind::None {
        0.0
    } else {
        1.0
    };

    Style {
        display: Display::Flex,
        position: match resolved.position {
            PositionKind::Static => taffy::Position::Relative,
            PositionKind::Absolute => taffy::Position::Absolute,
        },
        inset: taffy::Rect {
            top: offset(resolved.top),
            right: offset(resolved.right),
            bottom: offset(resolved.bottom),
            left: offset(resolved.left),
        },
        size: taffy::Size {
            width: dimension(resolved.width),
            height: dimension(resolved.height),
        },
        min_size: taffy::Size {
            width: dimension(resolved.min_width),
            height: dimension(resolved.min_height),
        },
        max_size: taffy::Size {
            width: dimension(resolved.max_width),
            height: dimension(resolved.max_height),
        },
        margin: taffy::Rect {
            top: LengthPercentageAuto::Length(f32::from(resolved.margin.top)),
            right: LengthPercentageAuto::Length(f32::from(resolved.margin.right)),
            bottom: LengthPercentageAuto::Length(f32::from(resolved.margin.bottom)),
            left: LengthPercentageAuto::Length(f32::from(resolved.margin.left)),
        },
        padding: taffy::Rect {
            top: LengthPercentage::Length(f32::from(resolved.padding.top)),
            right: LengthPercentage::Length(f32::from(resolved.padding.right)),
            bottom: LengthPercentage::Length(f32::from(resolved.padding.bottom)),
            left: LengthPercentage::Length(f32::from(resolved.padding.left)),
        },
        border: taffy::Rect {
            top: LengthPercentage::Length(border_width),
            right: LengthPercentage::Length(border_width),
            bottom: LengthPercentage::Length(border_width),
            left: LengthPercentage::Length(border_width),
        },
        gap: taffy::Size {
            width: LengthPercentage::Length(f32::from(resolved.gap)),
            height: LengthPercentage::Length(f32::from(resolved.gap)),
        },
        flex_direction: match resolved.flex_direction {
            GFlexDirection::Row => FlexDirection::Row,
            GFlexDirection::Column => FlexDirection::Column,
        },
        flex_wrap: if resolved.flex_wrap {
            taffy::FlexWrap::Wrap
        } else {
            taffy::FlexWrap::NoWrap
        },
        flex_grow: resolved.flex_grow,
        flex_shrink: resolved.flex_shrink,
        justify_content: Some(match resolved.justify_content {
            GJustify::Start => JustifyContent::FlexStart,
            GJustify::Center => JustifyContent::Center,
            GJustify::End => JustifyContent::FlexEnd,
            GJustify::SpaceBetween => JustifyContent::SpaceBetween,
            GJustify::SpaceAround => JustifyContent::SpaceAround,
            GJustify::SpaceEvenly => JustifyContent::SpaceEvenly,
        }),
        align_items: Some(match resolved.align_items {
            GAlign::Stretch => AlignItems::Stretch,
            GAlign::Start => AlignItems::FlexStart,
            GAlign::Center => AlignItems::Center,
            GAlign::End => AlignItems::FlexEnd,
        }),
        ..Default::default()
    }
}

fn dimension(dim: Option<Dim>) -> Dimension {
    match dim {
        Some(Dim::Cells(n)) => Dimension::Length(f32::from(n)),
        Some(Dim::Percent(p)) => Dimension::Percent(p / 100.0),
        Some(Dim::Auto) | None => Dimension::Auto,
    }
}

fn offset(value: Option<i32>) -> LengthPercentageAuto {
    match value {
        Some(v) => LengthPercentageAuto::Length(v as f32),
        None => LengthPercentageAuto::Auto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_style::{Edges, NodeStyle};

    #[test]
    fn default_style_is_flex_relative() {
        let style = resolved_to_taffy(&NodeStyle::default().resolve(80));
        assert_eq!(style.display, Display::Flex);
        assert_eq!(style.position, taffy::Position::Relative);
        assert_eq!(style.flex_grow, 0.0);
        assert_eq!(style.flex_shrink, 1.0);
    }

    #[test]
    fn cells_become_lengths() {
        let resolved = NodeStyle::default()
            .width(Dim::Cells(40))
            .height(Dim::Cells(10))
            .resolve(80);
        let style = resolved_to_taffy(&resolved);
        assert_eq!(style.size.width, Dimension::Length(40.0));
        assert_eq!(style.size.height, Dimension::Length(10.0));
    }

    #[test]
    fn percent_scales_to_fraction() {
        let resolved = NodeStyle::default().width(Dim::Percent(50.0)).resolve(80);
        let style = resolved_to_taffy(&resolved);
        assert_eq!(style.size.width, Dimension::Percent(0.5));
    }

    #[test]
    fn border_adds_one_cell_edges() {
        let resolved = NodeStyle::default().border(BorderKind::Single).resolve(80);
        let style = resolved_to_taffy(&resolved);
        assert_eq!(style.border.top, LengthPercentage::Length(1.0));
        assert_eq!(style.border.left, LengthPercentage::Length(1.0));
    }

    #[test]
    fn padding_edges_carried() {
        let mut resolved = NodeStyle::default().resolve(80);
        resolved.padding = Edges {
            top: 1,
            right: 2,
            bottom: 3,
            left: 4,
        };
        let style = resolved_to_taffy(&resolved);
        assert_eq!(style.padding.top, LengthPercentage::Length(1.0));
        assert_eq!(style.padding.right, LengthPercentage::Length(2.0));
        assert_eq!(style.padding.bottom, LengthPercentage::Length(3.0));
        assert_eq!(style.padding.left, LengthPercentage::Length(4.0));
    }

    #[test]
    fn absolute_position_maps_offsets() {
        let resolved = NodeStyle::default()
            .position(PositionKind::Absolute)
            .top(2)
            .left(3)
            .resolve(80);
        let style = resolved_to_taffy(&resolved);
        assert_eq!(style.position, taffy::Position::Absolute);
        assert_eq!(style.inset.top, LengthPercentageAuto::Length(2.0));
        assert_eq!(style.inset.left, LengthPercentageAuto::Length(3.0));
        assert_eq!(style.inset.right, LengthPercentageAuto::Auto);
    }
}
