use serde::{Deserialize, Serialize};
use shared::error::AppError;

macro_rules! define_id {
    ($id_type:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $id_type(uuid::Uuid);

        impl $id_type {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            pub fn raw(self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $id_type {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<uuid::Uuid> for $id_type {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $id_type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $id_type {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(UserId);
define_id!(TeacherId);
define_id!(ChatId);
define_id!(CourseId);
define_id!(BookingRequestId);

// 講師スコープのスロット ID。基底は講師ごとの小さな連番整数で、
// 繰り返し展開で生成されたインスタンスには `_{n}` サフィックスが付く
// （例: `3_1`）。グローバルに一意なのは保持する講師側のキーであり、
// この ID 単体ではない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SlotId {
    base: u32,
    seq: Option<u32>,
}

impl SlotId {
    pub fn new(base: u32) -> Self {
        Self { base, seq: None }
    }

    pub fn expanded(base: u32, seq: u32) -> Self {
        Self {
            base,
            seq: Some(seq),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn is_expanded(&self) -> bool {
        self.seq.is_some()
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.seq {
            Some(seq) => write!(f, "{}_{}", self.base, seq),
            None => write!(f, "{}", self.base),
        }
    }
}

impl From<SlotId> for String {
    fn from(value: SlotId) -> Self {
        value.to_string()
    }
}

impl std::str::FromStr for SlotId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, '_');
        let base = parts
            .next()
            .unwrap_or_default()
            .parse::<u32>()
            .map_err(|_| {
                AppError::ConversionEntityError(format!("スロット ID を解釈できません: {s}"))
            })?;
        let seq = match parts.next() {
            None => None,
            Some(rest) => Some(rest.parse::<u32>().map_err(|_| {
                AppError::ConversionEntityError(format!("スロット ID を解釈できません: {s}"))
            })?),
        };
        Ok(Self { base, seq })
    }
}

impl TryFrom<String> for SlotId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
