//! Static silhouette library.
//!
//! Outlines are closed polylines in normalized 0..100 units, stored in screen
//! coordinates (y grows downward). Anchor angles are measured counter-clockwise
//! from +x with 90 pointing toward the top of the shape, so an anchor with
//! outward angle 90 faces the north side of its grid cell at rotation 0.

pub const SHAPE_UNITS: f32 = 100.0;
pub const ANCHORS_MIN: usize = 4;
pub const ANCHORS_MAX: usize = 8;

pub const CATEGORY_ANIMALS: &str = "animals";
pub const CATEGORY_NATURE: &str = "nature";
pub const CATEGORY_SYMBOLS: &str = "symbols";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPoint {
    pub id: u8,
    pub x: f32,
    pub y: f32,
    pub outward_angle_deg: f32,
    pub segment: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct BaseShape {
    pub slug: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub outline: &'static [(f32, f32)],
    pub anchors: &'static [AnchorPoint],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BaseShape {
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox {
            min_x: f32::MAX,
            min_y: f32::MAX,
            max_x: f32::MIN,
            max_y: f32::MIN,
        };
        for &(x, y) in self.outline {
            bb.min_x = bb.min_x.min(x);
            bb.min_y = bb.min_y.min(y);
            bb.max_x = bb.max_x.max(x);
            bb.max_y = bb.max_y.max(y);
        }
        bb
    }

    pub fn area(&self) -> f32 {
        let points = self.outline;
        if points.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..points.len() {
            let (x0, y0) = points[i];
            let (x1, y1) = points[(i + 1) % points.len()];
            sum += x0 * y1 - x1 * y0;
        }
        (sum * 0.5).abs()
    }
}

macro_rules! anchor {
    ($id:expr, $x:expr, $y:expr, $angle:expr, $segment:expr) => {
        AnchorPoint {
            id: $id,
            x: $x,
            y: $y,
            outward_angle_deg: $angle,
            segment: $segment,
        }
    };
}

const FOX_OUTLINE: &[(f32, f32)] = &[
    (50.0, 8.0),
    (62.0, 14.0),
    (72.0, 6.0),
    (78.0, 10.0),
    (76.0, 26.0),
    (86.0, 38.0),
    (90.0, 54.0),
    (86.0, 70.0),
    (74.0, 84.0),
    (60.0, 92.0),
    (50.0, 94.0),
    (40.0, 92.0),
    (26.0, 84.0),
    (14.0, 70.0),
    (10.0, 54.0),
    (14.0, 38.0),
    (24.0, 26.0),
    (22.0, 10.0),
    (28.0, 6.0),
    (38.0, 14.0),
];

const FOX_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 7.0, 90.0, "ears"),
    anchor!(1, 89.0, 54.0, 0.0, "cheek-right"),
    anchor!(2, 50.0, 93.0, 270.0, "muzzle"),
    anchor!(3, 11.0, 54.0, 180.0, "cheek-left"),
];

const CAT_OUTLINE: &[(f32, f32)] = &[
    (50.0, 10.0),
    (64.0, 16.0),
    (74.0, 4.0),
    (80.0, 8.0),
    (80.0, 26.0),
    (88.0, 40.0),
    (90.0, 56.0),
    (84.0, 72.0),
    (72.0, 86.0),
    (56.0, 94.0),
    (44.0, 94.0),
    (28.0, 86.0),
    (16.0, 72.0),
    (10.0, 56.0),
    (12.0, 40.0),
    (20.0, 26.0),
    (20.0, 8.0),
    (26.0, 4.0),
    (36.0, 16.0),
];

const CAT_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 9.0, 90.0, "forehead"),
    anchor!(1, 89.0, 50.0, 0.0, "whisker-right"),
    anchor!(2, 50.0, 93.0, 270.0, "chin"),
    anchor!(3, 11.0, 50.0, 180.0, "whisker-left"),
    anchor!(4, 77.0, 10.0, 45.0, "ear-right"),
    anchor!(5, 23.0, 10.0, 135.0, "ear-left"),
];

const RABBIT_OUTLINE: &[(f32, f32)] = &[
    (42.0, 4.0),
    (48.0, 8.0),
    (50.0, 28.0),
    (54.0, 8.0),
    (60.0, 4.0),
    (64.0, 10.0),
    (60.0, 34.0),
    (74.0, 42.0),
    (84.0, 56.0),
    (86.0, 72.0),
    (78.0, 86.0),
    (62.0, 94.0),
    (42.0, 94.0),
    (26.0, 86.0),
    (16.0, 72.0),
    (16.0, 56.0),
    (24.0, 42.0),
    (38.0, 34.0),
    (36.0, 10.0),
];

const RABBIT_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 51.0, 6.0, 90.0, "ears"),
    anchor!(1, 85.0, 64.0, 0.0, "haunch-right"),
    anchor!(2, 52.0, 93.0, 270.0, "paws"),
    anchor!(3, 16.0, 64.0, 180.0, "haunch-left"),
];

const OWL_OUTLINE: &[(f32, f32)] = &[
    (30.0, 10.0),
    (40.0, 16.0),
    (50.0, 12.0),
    (60.0, 16.0),
    (70.0, 10.0),
    (76.0, 18.0),
    (82.0, 34.0),
    (84.0, 56.0),
    (80.0, 76.0),
    (68.0, 90.0),
    (50.0, 96.0),
    (32.0, 90.0),
    (20.0, 76.0),
    (16.0, 56.0),
    (18.0, 34.0),
    (24.0, 18.0),
];

const OWL_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 13.0, 90.0, "brow"),
    anchor!(1, 83.0, 52.0, 0.0, "wing-right"),
    anchor!(2, 50.0, 95.0, 270.0, "talons"),
    anchor!(3, 17.0, 52.0, 180.0, "wing-left"),
    anchor!(4, 79.0, 26.0, 45.0, "tuft-right"),
    anchor!(5, 21.0, 26.0, 135.0, "tuft-left"),
];

const FISH_OUTLINE: &[(f32, f32)] = &[
    (8.0, 50.0),
    (20.0, 34.0),
    (38.0, 24.0),
    (58.0, 22.0),
    (74.0, 30.0),
    (84.0, 42.0),
    (96.0, 30.0),
    (96.0, 70.0),
    (84.0, 58.0),
    (74.0, 70.0),
    (58.0, 78.0),
    (38.0, 76.0),
    (20.0, 66.0),
];

const FISH_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 23.0, 90.0, "dorsal"),
    anchor!(1, 95.0, 50.0, 0.0, "tail"),
    anchor!(2, 50.0, 77.0, 270.0, "belly"),
    anchor!(3, 9.0, 50.0, 180.0, "mouth"),
];

const TURTLE_OUTLINE: &[(f32, f32)] = &[
    (50.0, 16.0),
    (66.0, 20.0),
    (78.0, 30.0),
    (84.0, 44.0),
    (94.0, 42.0),
    (96.0, 50.0),
    (88.0, 56.0),
    (84.0, 68.0),
    (74.0, 80.0),
    (80.0, 90.0),
    (70.0, 92.0),
    (62.0, 84.0),
    (38.0, 84.0),
    (30.0, 92.0),
    (20.0, 90.0),
    (26.0, 80.0),
    (16.0, 68.0),
    (12.0, 52.0),
    (16.0, 36.0),
    (28.0, 24.0),
];

const TURTLE_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 17.0, 90.0, "shell-top"),
    anchor!(1, 95.0, 46.0, 0.0, "head"),
    anchor!(2, 50.0, 84.0, 270.0, "plastron"),
    anchor!(3, 13.0, 52.0, 180.0, "tail"),
    anchor!(4, 81.0, 26.0, 45.0, "shell-right"),
    anchor!(5, 19.0, 28.0, 135.0, "shell-left"),
    anchor!(6, 77.0, 88.0, 315.0, "leg-right"),
    anchor!(7, 23.0, 88.0, 225.0, "leg-left"),
];

const BUTTERFLY_OUTLINE: &[(f32, f32)] = &[
    (50.0, 22.0),
    (58.0, 10.0),
    (74.0, 6.0),
    (90.0, 14.0),
    (94.0, 32.0),
    (84.0, 46.0),
    (66.0, 50.0),
    (84.0, 56.0),
    (92.0, 70.0),
    (86.0, 86.0),
    (70.0, 92.0),
    (56.0, 84.0),
    (50.0, 70.0),
    (44.0, 84.0),
    (30.0, 92.0),
    (14.0, 86.0),
    (8.0, 70.0),
    (16.0, 56.0),
    (34.0, 50.0),
    (16.0, 46.0),
    (6.0, 32.0),
    (10.0, 14.0),
    (26.0, 6.0),
    (42.0, 10.0),
];

const BUTTERFLY_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 14.0, 90.0, "antennae"),
    anchor!(1, 91.0, 40.0, 0.0, "forewing-right"),
    anchor!(2, 50.0, 86.0, 270.0, "hindwing-tip"),
    anchor!(3, 9.0, 40.0, 180.0, "forewing-left"),
    anchor!(4, 89.0, 78.0, 315.0, "hindwing-right"),
    anchor!(5, 11.0, 78.0, 225.0, "hindwing-left"),
];

const LEAF_OUTLINE: &[(f32, f32)] = &[
    (50.0, 4.0),
    (64.0, 14.0),
    (78.0, 30.0),
    (86.0, 50.0),
    (82.0, 68.0),
    (70.0, 82.0),
    (56.0, 90.0),
    (52.0, 96.0),
    (48.0, 96.0),
    (44.0, 90.0),
    (30.0, 82.0),
    (18.0, 68.0),
    (14.0, 50.0),
    (22.0, 30.0),
    (36.0, 14.0),
];

const LEAF_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 5.0, 90.0, "tip"),
    anchor!(1, 85.0, 52.0, 0.0, "margin-right"),
    anchor!(2, 50.0, 95.0, 270.0, "stem"),
    anchor!(3, 15.0, 52.0, 180.0, "margin-left"),
];

const ACORN_OUTLINE: &[(f32, f32)] = &[
    (50.0, 6.0),
    (58.0, 10.0),
    (72.0, 16.0),
    (80.0, 26.0),
    (82.0, 36.0),
    (76.0, 42.0),
    (78.0, 58.0),
    (72.0, 76.0),
    (60.0, 90.0),
    (50.0, 94.0),
    (40.0, 90.0),
    (28.0, 76.0),
    (22.0, 58.0),
    (24.0, 42.0),
    (18.0, 36.0),
    (20.0, 26.0),
    (28.0, 16.0),
    (42.0, 10.0),
];

const ACORN_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 7.0, 90.0, "cap"),
    anchor!(1, 79.0, 50.0, 0.0, "shell-right"),
    anchor!(2, 50.0, 93.0, 270.0, "point"),
    anchor!(3, 21.0, 50.0, 180.0, "shell-left"),
];

const PINE_OUTLINE: &[(f32, f32)] = &[
    (50.0, 4.0),
    (64.0, 26.0),
    (56.0, 26.0),
    (72.0, 48.0),
    (62.0, 48.0),
    (80.0, 72.0),
    (56.0, 72.0),
    (56.0, 92.0),
    (44.0, 92.0),
    (44.0, 72.0),
    (20.0, 72.0),
    (38.0, 48.0),
    (28.0, 48.0),
    (44.0, 26.0),
    (36.0, 26.0),
];

const PINE_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 6.0, 90.0, "crown"),
    anchor!(1, 70.0, 60.0, 0.0, "bough-right"),
    anchor!(2, 50.0, 91.0, 270.0, "trunk"),
    anchor!(3, 30.0, 60.0, 180.0, "bough-left"),
];

const STAR_OUTLINE: &[(f32, f32)] = &[
    (50.0, 4.0),
    (61.0, 36.0),
    (95.0, 36.0),
    (68.0, 57.0),
    (78.0, 90.0),
    (50.0, 70.0),
    (22.0, 90.0),
    (32.0, 57.0),
    (5.0, 36.0),
    (39.0, 36.0),
];

const STAR_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 6.0, 90.0, "point-top"),
    anchor!(1, 93.0, 37.0, 0.0, "point-right"),
    anchor!(2, 50.0, 71.0, 270.0, "valley-bottom"),
    anchor!(3, 7.0, 37.0, 180.0, "point-left"),
    anchor!(4, 76.0, 88.0, 315.0, "point-lower-right"),
];

const HEART_OUTLINE: &[(f32, f32)] = &[
    (50.0, 30.0),
    (58.0, 18.0),
    (70.0, 12.0),
    (82.0, 16.0),
    (90.0, 28.0),
    (90.0, 44.0),
    (80.0, 60.0),
    (64.0, 76.0),
    (50.0, 92.0),
    (36.0, 76.0),
    (20.0, 60.0),
    (10.0, 44.0),
    (10.0, 28.0),
    (18.0, 16.0),
    (30.0, 12.0),
    (42.0, 18.0),
];

const HEART_ANCHORS: &[AnchorPoint] = &[
    anchor!(0, 50.0, 28.0, 90.0, "cleft"),
    anchor!(1, 89.0, 38.0, 0.0, "lobe-right"),
    anchor!(2, 50.0, 91.0, 270.0, "point"),
    anchor!(3, 11.0, 38.0, 180.0, "lobe-left"),
];

pub const SHAPE_CATALOG: &[BaseShape] = &[
    BaseShape {
        slug: "fox",
        label: "Fox",
        category: CATEGORY_ANIMALS,
        outline: FOX_OUTLINE,
        anchors: FOX_ANCHORS,
    },
    BaseShape {
        slug: "cat",
        label: "Cat",
        category: CATEGORY_ANIMALS,
        outline: CAT_OUTLINE,
        anchors: CAT_ANCHORS,
    },
    BaseShape {
        slug: "rabbit",
        label: "Rabbit",
        category: CATEGORY_ANIMALS,
        outline: RABBIT_OUTLINE,
        anchors: RABBIT_ANCHORS,
    },
    BaseShape {
        slug: "owl",
        label: "Owl",
        category: CATEGORY_ANIMALS,
        outline: OWL_OUTLINE,
        anchors: OWL_ANCHORS,
    },
    BaseShape {
        slug: "fish",
        label: "Fish",
        category: CATEGORY_ANIMALS,
        outline: FISH_OUTLINE,
        anchors: FISH_ANCHORS,
    },
    BaseShape {
        slug: "turtle",
        label: "Turtle",
        category: CATEGORY_ANIMALS,
        outline: TURTLE_OUTLINE,
        anchors: TURTLE_ANCHORS,
    },
    BaseShape {
        slug: "butterfly",
        label: "Butterfly",
        category: CATEGORY_ANIMALS,
        outline: BUTTERFLY_OUTLINE,
        anchors: BUTTERFLY_ANCHORS,
    },
    BaseShape {
        slug: "leaf",
        label: "Leaf",
        category: CATEGORY_NATURE,
        outline: LEAF_OUTLINE,
        anchors: LEAF_ANCHORS,
    },
    BaseShape {
        slug: "acorn",
        label: "Acorn",
        category: CATEGORY_NATURE,
        outline: ACORN_OUTLINE,
        anchors: ACORN_ANCHORS,
    },
    BaseShape {
        slug: "pine",
        label: "Pine",
        category: CATEGORY_NATURE,
        outline: PINE_OUTLINE,
        anchors: PINE_ANCHORS,
    },
    BaseShape {
        slug: "star",
        label: "Star",
        category: CATEGORY_SYMBOLS,
        outline: STAR_OUTLINE,
        anchors: STAR_ANCHORS,
    },
    BaseShape {
        slug: "heart",
        label: "Heart",
        category: CATEGORY_SYMBOLS,
        outline: HEART_OUTLINE,
        anchors: HEART_ANCHORS,
    },
];

pub fn shape_by_slug(slug: &str) -> Option<&'static BaseShape> {
    let trimmed = slug.trim();
    SHAPE_CATALOG
        .iter()
        .find(|shape| shape.slug.eq_ignore_ascii_case(trimmed))
}

pub fn shape_by_label(label: &str) -> Option<&'static BaseShape> {
    let trimmed = label.trim();
    SHAPE_CATALOG
        .iter()
        .find(|shape| shape.label.eq_ignore_ascii_case(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_slugs_are_unique() {
        let mut seen = HashSet::new();
        for shape in SHAPE_CATALOG {
            assert!(seen.insert(shape.slug), "duplicate slug {}", shape.slug);
        }
    }

    #[test]
    fn outlines_are_closed_polygons_in_range() {
        for shape in SHAPE_CATALOG {
            assert!(shape.outline.len() >= 3, "{} outline too small", shape.slug);
            for &(x, y) in shape.outline {
                assert!((0.0..=SHAPE_UNITS).contains(&x), "{} x out of range", shape.slug);
                assert!((0.0..=SHAPE_UNITS).contains(&y), "{} y out of range", shape.slug);
            }
            assert!(shape.area() > 0.0, "{} has no area", shape.slug);
        }
    }

    #[test]
    fn anchor_counts_and_ids() {
        for shape in SHAPE_CATALOG {
            let count = shape.anchors.len();
            assert!(
                (ANCHORS_MIN..=ANCHORS_MAX).contains(&count),
                "{} has {} anchors",
                shape.slug,
                count
            );
            for (idx, anchor) in shape.anchors.iter().enumerate() {
                assert_eq!(anchor.id as usize, idx, "{} anchor ids not ordinal", shape.slug);
                assert!((0.0..360.0).contains(&anchor.outward_angle_deg));
            }
        }
    }

    #[test]
    fn lookups_ignore_case_and_whitespace() {
        assert!(shape_by_slug(" Fox ").is_some());
        assert!(shape_by_label("heart").is_some());
        assert!(shape_by_slug("dragon").is_none());
    }
}
