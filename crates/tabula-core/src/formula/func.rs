use crate::{Error, Result};

macro_rules! funcs {
    ( $( $category:ident { $( $variant:ident => $name:literal ( $min:literal, $max:expr ), )* } )* ) => {
        /// The closed set of built-in formula functions.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Func {
            $( $( $variant, )* )*
        }

        impl Func {
            /// All functions, grouped by category.
            pub const ALL: &'static [Func] = &[ $( $( Func::$variant, )* )* ];

            /// Canonical (upper case) name
            pub fn name(self) -> &'static str {
                match self {
                    $( $( Func::$variant => $name, )* )*
                }
            }

            pub fn category(self) -> FuncCategory {
                match self {
                    $( $( Func::$variant => FuncCategory::$category, )* )*
                }
            }

            /// Minimum and (when bounded) maximum number of arguments.
            pub fn arity(self) -> (usize, Option<usize>) {
                match self {
                    $( $( Func::$variant => ($min, $max), )* )*
                }
            }

            /// Looks up a function by name, ignoring case.
            pub fn from_name(name: &str) -> Option<Func> {
                let upper = name.to_ascii_uppercase();
                match upper.as_str() {
                    $( $( $name => Some(Func::$variant), )* )*
                    _ => None,
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncCategory {
    Numeric,
    Text,
    Logical,
    DateTime,
    Array,
    System,
}

const MANY: Option<usize> = None;

funcs! {
    Numeric {
        Sum => "SUM" (1, MANY),
        Average => "AVERAGE" (1, MANY),
        Max => "MAX" (1, MANY),
        Min => "MIN" (1, MANY),
        Round => "ROUND" (1, Some(2)),
        RoundUp => "ROUNDUP" (1, Some(2)),
        RoundDown => "ROUNDDOWN" (1, Some(2)),
        Ceiling => "CEILING" (1, Some(1)),
        Floor => "FLOOR" (1, Some(1)),
        Abs => "ABS" (1, Some(1)),
        Sqrt => "SQRT" (1, Some(1)),
        Power => "POWER" (2, Some(2)),
        Exp => "EXP" (1, Some(1)),
        Log => "LOG" (1, Some(2)),
        Mod => "MOD" (2, Some(2)),
        Int => "INT" (1, Some(1)),
        Value => "VALUE" (1, Some(1)),
    }
    Text {
        Concatenate => "CONCATENATE" (1, MANY),
        Left => "LEFT" (1, Some(2)),
        Right => "RIGHT" (1, Some(2)),
        Mid => "MID" (3, Some(3)),
        Len => "LEN" (1, Some(1)),
        Upper => "UPPER" (1, Some(1)),
        Lower => "LOWER" (1, Some(1)),
        Trim => "TRIM" (1, Some(1)),
        Substitute => "SUBSTITUTE" (3, Some(3)),
        Find => "FIND" (2, Some(3)),
        Rept => "REPT" (2, Some(2)),
        T => "T" (1, Some(1)),
    }
    Logical {
        If => "IF" (2, Some(3)),
        And => "AND" (1, MANY),
        Or => "OR" (1, MANY),
        Not => "NOT" (1, Some(1)),
        Xor => "XOR" (1, MANY),
        Switch => "SWITCH" (3, MANY),
        Blank => "BLANK" (0, Some(0)),
    }
    DateTime {
        Today => "TODAY" (0, Some(0)),
        Now => "NOW" (0, Some(0)),
        Year => "YEAR" (1, Some(1)),
        Month => "MONTH" (1, Some(1)),
        Day => "DAY" (1, Some(1)),
        Hour => "HOUR" (1, Some(1)),
        Minute => "MINUTE" (1, Some(1)),
        Second => "SECOND" (1, Some(1)),
        Weekday => "WEEKDAY" (1, Some(1)),
        DatetimeDiff => "DATETIME_DIFF" (2, Some(3)),
    }
    Array {
        CountAll => "COUNTALL" (1, Some(1)),
        ArrayJoin => "ARRAY_JOIN" (1, Some(2)),
    }
    System {
        RecordId => "RECORD_ID" (0, Some(0)),
    }
}

impl Func {
    /// Validates the number of arguments passed to the function.
    pub fn check_arity(self, len: usize) -> Result<()> {
        let (min, max) = self.arity();
        if len < min || max.is_some_and(|max| len > max) {
            let expected = match max {
                Some(max) if max == min => format!("{min}"),
                Some(max) => format!("{min} to {max}"),
                None => format!("at least {min}"),
            };
            return Err(Error::invalid_formula(format!(
                "{} expects {expected} argument(s), got {len}",
                self.name()
            )));
        }
        Ok(())
    }
}

impl core::fmt::Display for Func {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for func in Func::ALL {
            assert_eq!(Func::from_name(func.name()), Some(*func));
        }
        assert_eq!(Func::from_name("concatenate"), Some(Func::Concatenate));
        assert_eq!(Func::from_name("NOPE"), None);
    }

    #[test]
    fn arity_is_checked() {
        assert!(Func::If.check_arity(3).is_ok());
        assert!(Func::If.check_arity(1).unwrap_err().is_invalid_formula());
        assert!(Func::Sum.check_arity(12).is_ok());
        assert!(Func::Now.check_arity(1).is_err());
    }
}
