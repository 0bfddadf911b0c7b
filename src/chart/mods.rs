use std::str::FromStr;

/// Active gameplay modifiers, fixed for the chart's lifetime.
///
/// `fast`/`slow` scale resolved note speed; the flips mirror render space.
/// `flip_all` implies both axis flips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mods {
    pub fast: bool,
    pub slow: bool,
    pub flip_x: bool,
    pub flip_y: bool,
    pub flip_all: bool,
}

impl Mods {
    pub fn none() -> Self {
        Self::default()
    }

    /// Global speed multiplier. Fast wins if both speed mods are set.
    pub fn speed_multiplier(&self) -> f64 {
        if self.fast {
            1.5
        } else if self.slow {
            0.75
        } else {
            1.0
        }
    }

    pub fn flip_x_active(&self) -> bool {
        self.flip_x || self.flip_all
    }

    pub fn flip_y_active(&self) -> bool {
        self.flip_y || self.flip_all
    }

    pub(crate) fn horizontal_flip_sign(&self) -> f64 {
        if self.flip_x_active() { -1.0 } else { 1.0 }
    }
}

impl FromStr for Mods {
    type Err = String;

    /// Parses a comma-separated modifier list, e.g. `fast,flipx`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mods = Mods::default();
        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "fast" => mods.fast = true,
                "slow" => mods.slow = true,
                "flipx" => mods.flip_x = true,
                "flipy" => mods.flip_y = true,
                "flipall" => mods.flip_all = true,
                other => {
                    return Err(format!(
                        "unknown modifier '{}' (expected fast, slow, flipx, flipy or flipall)",
                        other
                    ));
                }
            }
        }
        Ok(mods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_wins_over_slow() {
        let mods = Mods {
            fast: true,
            slow: true,
            ..Mods::default()
        };
        assert_eq!(mods.speed_multiplier(), 1.5);
    }

    #[test]
    fn flip_all_implies_both_axes() {
        let mods: Mods = "flipall".parse().unwrap();
        assert!(mods.flip_x_active());
        assert!(mods.flip_y_active());
        assert!("fast,bogus".parse::<Mods>().is_err());
    }
}
