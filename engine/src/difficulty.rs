//! Coarse difficulty labels mapped to engine strength options.

/// Difficulty label shown to students, as sent by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Debutant,
    Facile,
    Moyen,
    Difficile,
    Expert,
}

impl Difficulty {
    /// Map a UI label to a difficulty. Unrecognized labels fall back to
    /// [`Difficulty::Moyen`]; casing is not significant.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "DEBUTANT" => Difficulty::Debutant,
            "FACILE" => Difficulty::Facile,
            "MOYEN" => Difficulty::Moyen,
            "DIFFICILE" => Difficulty::Difficile,
            "EXPERT" => Difficulty::Expert,
            _ => Difficulty::Moyen,
        }
    }

    /// Engine `Skill Level` value (0..=20).
    pub fn skill_level(self) -> u8 {
        match self {
            Difficulty::Debutant => 0,
            Difficulty::Facile => 5,
            Difficulty::Moyen => 10,
            Difficulty::Difficile => 15,
            Difficulty::Expert => 20,
        }
    }

    /// Approximate Elo ceiling for strength limiting. Full strength
    /// (skill 20) is unlimited.
    pub fn limit_elo(self) -> Option<u32> {
        let skill = u32::from(self.skill_level());
        if skill < 20 {
            Some(1350 + skill * 60)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_mapping_is_total() {
        assert_eq!(Difficulty::from_label("DEBUTANT").skill_level(), 0);
        assert_eq!(Difficulty::from_label("FACILE").skill_level(), 5);
        assert_eq!(Difficulty::from_label("MOYEN").skill_level(), 10);
        assert_eq!(Difficulty::from_label("DIFFICILE").skill_level(), 15);
        assert_eq!(Difficulty::from_label("EXPERT").skill_level(), 20);
    }

    #[test]
    fn test_unrecognized_label_defaults_to_10() {
        assert_eq!(Difficulty::from_label("GRANDMASTER").skill_level(), 10);
        assert_eq!(Difficulty::from_label("").skill_level(), 10);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        assert_eq!(Difficulty::from_label("expert").skill_level(), 20);
        assert_eq!(Difficulty::from_label("Facile").skill_level(), 5);
    }

    #[test]
    fn test_elo_limit_derivation() {
        assert_eq!(Difficulty::Debutant.limit_elo(), Some(1350));
        assert_eq!(Difficulty::Facile.limit_elo(), Some(1650));
        assert_eq!(Difficulty::Moyen.limit_elo(), Some(1950));
        assert_eq!(Difficulty::Difficile.limit_elo(), Some(2250));
        assert_eq!(Difficulty::Expert.limit_elo(), None);
    }
}
