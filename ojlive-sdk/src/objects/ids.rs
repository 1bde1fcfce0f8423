//! Opaque identifiers used in judge URLs and payloads.
//!
//! The backend issues UUIDs, but nothing here depends on that: identifiers
//! are carried as short strings and percent-encoded whenever they become a
//! path segment.

use std::borrow::Cow;
use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(CompactString);

        impl $name {
            pub fn new(value: impl Into<CompactString>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Percent-encoded form for use as a single URL path segment.
            pub fn path_segment(&self) -> Cow<'_, str> {
                urlencoding::encode(self.0.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a submission, issued by the judge on dispatch.
    SubmissionId
);
string_id!(
    /// Identifier of the submitting user.
    UserId
);
string_id!(
    /// Identifier of a problem.
    ProblemId
);
string_id!(
    /// Identifier of a contest; scopes the leaderboard.
    ContestId
);
string_id!(
    /// Language name as registered on the judge (`python`, `c_cpp`, `java`).
    Language
);
