//! Volume classification from chapter titles.
//!
//! Titles shaped like `Volume 3 Chapter 12: The Storm` (any letter case) belong to
//! a volume; anything else lands in the "Extra" group.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static VOLUME_CHAPTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^volume ([0-9]+) chapter ([0-9]+): (.+)")
        .expect("volume/chapter pattern is valid")
});

/// Grouping key of a chapter. `Extra` orders before every real volume, matching
/// its numeric sentinel of -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VolumeKey {
    Extra,
    Volume(u32),
}

impl VolumeKey {
    pub const EXTRA_NUMBER: i64 = -1;

    pub fn number(self) -> i64 {
        match self {
            Self::Extra => Self::EXTRA_NUMBER,
            Self::Volume(n) => i64::from(n),
        }
    }
}

impl fmt::Display for VolumeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extra => f.write_str("Extra"),
            Self::Volume(n) => write!(f, "Volume {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Volume {
        volume: u32,
        chapter: u32,
        title: String,
    },
    Extra {
        title: String,
    },
}

impl Classification {
    pub fn volume_key(&self) -> VolumeKey {
        match self {
            Self::Volume { volume, .. } => VolumeKey::Volume(*volume),
            Self::Extra { .. } => VolumeKey::Extra,
        }
    }

    pub fn chapter_number(&self) -> Option<u32> {
        match self {
            Self::Volume { chapter, .. } => Some(*chapter),
            Self::Extra { .. } => None,
        }
    }

    pub fn bare_title(&self) -> &str {
        match self {
            Self::Volume { title, .. } | Self::Extra { title } => title.as_str(),
        }
    }

    /// Display heading of the chapter document.
    pub fn heading(&self) -> String {
        match self {
            Self::Volume { chapter, title, .. } => format!("Chapter {chapter}: {title}"),
            Self::Extra { title } => title.clone(),
        }
    }
}

/// Never fails: an unmatched title is an `Extra` chapter.
pub fn classify(title: &str) -> Classification {
    let extra = || Classification::Extra {
        title: title.to_owned(),
    };

    let Some(caps) = VOLUME_CHAPTER.captures(title) else {
        return extra();
    };
    let volume = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let chapter = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
    let rest = caps.get(3).map(|m| m.as_str().to_owned());

    match (volume, chapter, rest) {
        (Some(volume), Some(chapter), Some(title)) if volume >= 1 => Classification::Volume {
            volume,
            chapter,
            title,
        },
        _ => extra(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_volume_and_chapter() {
        let class = classify("Volume 1 Chapter 1: Dawn");
        assert_eq!(
            class,
            Classification::Volume {
                volume: 1,
                chapter: 1,
                title: "Dawn".to_owned()
            }
        );
        assert_eq!(class.volume_key(), VolumeKey::Volume(1));
        assert_eq!(class.heading(), "Chapter 1: Dawn");
    }

    #[test]
    fn match_is_case_insensitive_and_keeps_colons_in_rest() {
        let class = classify("VOLUME 12 chapter 305: Part 2: The Return");
        assert_eq!(class.volume_key().number(), 12);
        assert_eq!(class.chapter_number(), Some(305));
        assert_eq!(class.bare_title(), "Part 2: The Return");
    }

    #[test]
    fn unmatched_title_is_extra_verbatim() {
        let class = classify("Interlude");
        assert_eq!(
            class,
            Classification::Extra {
                title: "Interlude".to_owned()
            }
        );
        assert_eq!(class.volume_key().number(), -1);
        assert_eq!(class.chapter_number(), None);
        assert_eq!(class.heading(), "Interlude");
    }

    #[test]
    fn pattern_is_anchored_at_start() {
        for title in [
            "Prologue - Volume 1 Chapter 1: Dawn",
            " Volume 1 Chapter 1: Dawn",
            "Volume 1 Chapter 1 Dawn",
            "Volume 1 Chapter 1: ",
            "Volume one Chapter 1: Dawn",
            "",
        ] {
            let class = classify(title);
            assert_eq!(class.volume_key(), VolumeKey::Extra, "{title:?}");
            assert_eq!(class.bare_title(), title);
        }
    }

    #[test]
    fn volume_zero_and_overflowing_numbers_are_extra() {
        assert_eq!(
            classify("Volume 0 Chapter 3: Before").volume_key(),
            VolumeKey::Extra
        );
        assert_eq!(
            classify("Volume 99999999999 Chapter 1: Far").volume_key(),
            VolumeKey::Extra
        );
    }

    #[test]
    fn chapter_zero_is_accepted() {
        let class = classify("Volume 2 Chapter 0: Prologue");
        assert_eq!(class.volume_key(), VolumeKey::Volume(2));
        assert_eq!(class.heading(), "Chapter 0: Prologue");
    }

    #[test]
    fn extra_sorts_before_first_volume() {
        let mut keys = vec![
            VolumeKey::Volume(2),
            VolumeKey::Extra,
            VolumeKey::Volume(1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            [VolumeKey::Extra, VolumeKey::Volume(1), VolumeKey::Volume(2)]
        );
        assert!(VolumeKey::Extra.number() < VolumeKey::Volume(1).number());
        assert_eq!(VolumeKey::Extra.to_string(), "Extra");
        assert_eq!(VolumeKey::Volume(3).to_string(), "Volume 3");
    }
}
