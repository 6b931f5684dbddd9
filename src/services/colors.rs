//! Display colours for games and their collections.
//!
//! Each game has a base colour. Collections are drawn in progressively
//! darker shades of it, by their position in the game's collection list.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Neutral grey used for anything without a known game
pub const DEFAULT_COLOR: &str = "#6c757d";

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if hex.len() != 7 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// True for `#rrggbb` colours, either case
pub fn is_valid_hex_color(hex: &str) -> bool {
    parse_hex(hex).is_some()
}

/// Scales each channel of `hex` by `factor`, truncating and clamping to
/// `0..=255`. Input that is not a `#rrggbb` colour comes back unchanged.
pub fn adjust_color_brightness(hex: &str, factor: Decimal) -> String {
    let Some(channels) = parse_hex(hex) else {
        return hex.to_string();
    };

    let scale = |c: u8| -> u8 {
        let scaled = (Decimal::from(c) * factor).trunc();
        scaled
            .clamp(Decimal::ZERO, Decimal::from(u8::MAX))
            .to_u8()
            .unwrap_or(0)
    };

    let [r, g, b] = channels.map(scale);
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Darkening factor for the collection at `index`: 0.9, 0.8, ... down to
/// zero and below for the tenth collection onwards.
pub fn collection_factor(index: usize) -> Decimal {
    Decimal::ONE - Decimal::new(1, 1) * Decimal::from(index as u64 + 1)
}

/// One game of the palette with its collections in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePalette {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub collections: Vec<String>,
}

/// Resolved colours for one release or event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayColors {
    pub game_color: String,
    pub collection_color: String,
}

impl Default for DisplayColors {
    fn default() -> Self {
        Self {
            game_color: DEFAULT_COLOR.to_string(),
            collection_color: DEFAULT_COLOR.to_string(),
        }
    }
}

/// Game → colour and collection ordering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub games: Vec<GamePalette>,
}

impl Palette {
    pub fn new(games: Vec<GamePalette>) -> Self {
        Self { games }
    }

    pub fn game(&self, name: &str) -> Option<&GamePalette> {
        self.games.iter().find(|g| g.name == name)
    }

    pub fn game_names(&self) -> impl Iterator<Item = &str> {
        self.games.iter().map(|g| g.name.as_str())
    }

    pub fn colors_for(&self, game: Option<&str>, collection: Option<&str>) -> DisplayColors {
        let Some(entry) = game.filter(|g| !g.is_empty()).and_then(|g| self.game(g)) else {
            return DisplayColors::default();
        };

        let position = collection.and_then(|c| entry.collections.iter().position(|n| n == c));
        let collection_color = match position {
            Some(index) => adjust_color_brightness(&entry.color, collection_factor(index)),
            None => entry.color.clone(),
        };

        DisplayColors {
            game_color: entry.color.clone(),
            collection_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn palette() -> Palette {
        Palette::new(vec![GamePalette {
            name: "Lorcana".into(),
            color: "#3366cc".into(),
            collections: vec!["Primer Capítulo".into(), "Marea".into()],
        }])
    }

    #[rstest]
    #[case("#ffffff", dec!(0.9), "#e5e5e5")]
    #[case("#3366cc", dec!(0.8), "#2851a3")]
    #[case("#3366cc", dec!(1), "#3366cc")]
    #[case("#ABCDEF", dec!(1), "#abcdef")]
    #[case("#808080", dec!(2), "#ffffff")]
    #[case("#808080", dec!(-0.1), "#000000")]
    fn scales_channels(#[case] input: &str, #[case] factor: Decimal, #[case] expected: &str) {
        assert_eq!(adjust_color_brightness(input, factor), expected);
    }

    #[rstest]
    #[case("red")]
    #[case("#fff")]
    #[case("3366cc0")]
    #[case("#33zz66")]
    #[case("")]
    fn malformed_colors_pass_through(#[case] input: &str) {
        assert_eq!(adjust_color_brightness(input, dec!(0.5)), input);
    }

    #[test]
    fn factors_step_down_by_tenths() {
        assert_eq!(collection_factor(0), dec!(0.9));
        assert_eq!(collection_factor(1), dec!(0.8));
        assert_eq!(collection_factor(8), dec!(0.1));
        assert_eq!(collection_factor(9), dec!(0));
    }

    #[test]
    fn listed_collection_is_darkened_by_position() {
        let colors = palette().colors_for(Some("Lorcana"), Some("Marea"));
        assert_eq!(colors.game_color, "#3366cc");
        assert_eq!(colors.collection_color, "#2851a3");
    }

    #[test]
    fn unlisted_collection_uses_game_color() {
        let colors = palette().colors_for(Some("Lorcana"), Some("Otra"));
        assert_eq!(colors.collection_color, "#3366cc");

        let colors = palette().colors_for(Some("Lorcana"), None);
        assert_eq!(colors.collection_color, "#3366cc");
    }

    #[test]
    fn unknown_game_uses_default_color() {
        assert_eq!(
            palette().colors_for(Some("Magic"), Some("Marea")),
            DisplayColors::default()
        );
        assert_eq!(palette().colors_for(None, None), DisplayColors::default());
        assert_eq!(palette().colors_for(Some(""), None), DisplayColors::default());
    }

    #[test]
    fn tenth_collection_is_black() {
        let collections = (0..10).map(|i| format!("c{}", i)).collect();
        let palette = Palette::new(vec![GamePalette {
            name: "One Piece".into(),
            color: "#ff8800".into(),
            collections,
        }]);
        assert_eq!(
            palette.colors_for(Some("One Piece"), Some("c9")).collection_color,
            "#000000"
        );
    }

    proptest! {
        #[test]
        fn darkening_never_brightens(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255, index in 0usize..12) {
            let base = format!("#{:02x}{:02x}{:02x}", r, g, b);
            let derived = adjust_color_brightness(&base, collection_factor(index));
            let [dr, dg, db] = parse_hex(&derived).unwrap();
            prop_assert!(dr <= r && dg <= g && db <= b);
        }

        #[test]
        fn adjustment_is_deterministic(r in 0u8..=255, factor in 0i64..20) {
            let base = format!("#{:02x}0000", r);
            let factor = Decimal::new(factor, 1);
            prop_assert_eq!(
                adjust_color_brightness(&base, factor),
                adjust_color_brightness(&base, factor)
            );
        }
    }
}
