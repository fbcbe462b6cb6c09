//! Open modes.
//!
//! A mode string is one optional activity letter (`r`, `w`, `a`; read when
//! omitted) and one optional representation letter (`b`, `t`; text when
//! omitted), in either order. Anything else is [`FsError::InvalidMode`].

use std::str::FromStr;

use strum::{Display, EnumString};

use crate::error::{FsError, FsResult};

/// What a handle is opened to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Activity {
    #[default]
    Read,
    Write,
    Append,
}

/// How bytes cross the handle boundary. Storage is always raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Representation {
    Binary,
    #[default]
    Text,
}

/// Parsed open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenMode {
    pub activity: Activity,
    pub representation: Representation,
}

impl OpenMode {
    pub fn new(activity: Activity, representation: Representation) -> Self {
        Self {
            activity,
            representation,
        }
    }

    /// Parse a mode string such as `"rb"`, `"a"` or `"wt"`.
    pub fn parse(mode: &str) -> FsResult<Self> {
        let invalid = || FsError::InvalidMode(mode.to_owned());
        let mut activity = None;
        let mut representation = None;

        for c in mode.chars() {
            match c {
                'r' | 'w' | 'a' => {
                    let parsed = match c {
                        'r' => Activity::Read,
                        'w' => Activity::Write,
                        _ => Activity::Append,
                    };
                    if activity.replace(parsed).is_some() {
                        return Err(invalid());
                    }
                }
                'b' | 't' => {
                    let parsed = if c == 'b' {
                        Representation::Binary
                    } else {
                        Representation::Text
                    };
                    if representation.replace(parsed).is_some() {
                        return Err(invalid());
                    }
                }
                _ => return Err(invalid()),
            }
        }

        Ok(Self {
            activity: activity.unwrap_or_default(),
            representation: representation.unwrap_or_default(),
        })
    }

    pub fn read(&self) -> bool {
        self.activity == Activity::Read
    }

    pub fn write(&self) -> bool {
        self.activity == Activity::Write
    }

    pub fn append(&self) -> bool {
        self.activity == Activity::Append
    }

    pub fn is_text(&self) -> bool {
        self.representation == Representation::Text
    }

    pub fn is_binary(&self) -> bool {
        self.representation == Representation::Binary
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
