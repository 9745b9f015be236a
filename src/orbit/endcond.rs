use std::fmt;

/// Names and bit flags of the end conditions a marker can terminate with.
const FLAGS: [(&str, u32); 12] = [
    ("TLIM", 0x1),
    ("EMIN", 0x2),
    ("THERM", 0x4),
    ("WALL", 0x8),
    ("RHOMIN", 0x10),
    ("RHOMAX", 0x20),
    ("POLMAX", 0x40),
    ("TORMAX", 0x80),
    ("CPUMAX", 0x100),
    ("HYBRID", 0x200),
    ("NEUTR", 0x400),
    ("IONIZ", 0x800),
];

const ABORTED: &str = "ABORTED";
const NONE: &str = "NONE";

/// Why a marker's simulation ended, read from the `endcond` and `errormsg`
/// codes of the end state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndCondition {
    flags: u32,
    error: i64,
}

impl EndCondition {
    pub fn new(endcond: i64, errormsg: i64) -> Self {
        Self { flags: endcond as u32, error: errormsg }
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// The marker hit an error, whatever its flags say.
    pub fn is_aborted(&self) -> bool {
        self.error != 0
    }

    /// Names describing this condition.
    pub fn names(&self) -> Vec<&'static str> {
        if self.is_aborted() {
            return vec![ABORTED];
        }
        if self.flags == 0 {
            return vec![NONE];
        }
        FLAGS
            .iter()
            .filter(|(_, flag)| self.flags & flag != 0)
            .map(|&(name, _)| name)
            .collect()
    }

    /// Whether the condition carries the given name (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        self.names().iter().any(|own| own.eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for EndCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(" and "))
    }
}
