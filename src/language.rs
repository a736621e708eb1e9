use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages a submission may be written in
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    C,
}

/// Where the user's code lands relative to the generated driver
///
/// Each variant mirrors a declaration-order constraint of the target toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Script languages: user code first, driver appended so it can see the user's names
    AppendDriver,
    /// The driver is the outer compilation unit and the user's type follows it
    WrapUser,
    /// User code precedes the driver's `main` because functions need declaring before use
    PrecedeEntry,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Java, Language::C];

    pub fn placement(self) -> Placement {
        match self {
            Language::Python => Placement::AppendDriver,
            Language::Java => Placement::WrapUser,
            Language::C => Placement::PrecedeEntry,
        }
    }

    /// Source file name expected by the toolchain, `Main.java` being mandatory for `public class Main`
    pub fn file_name(self) -> &'static str {
        match self {
            Language::Python => "main.py",
            Language::Java => "Main.java",
            Language::C => "main.c",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "python3" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}
