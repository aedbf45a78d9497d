use super::{generator::string_literal, Fragment, Generator, Ty};

use tabula_core::{driver::Flavor, formula::Func, schema::ID_COLUMN, Error, Result};

impl Generator {
    /// Compiles a call to a built-in function over compiled arguments.
    pub fn func(&self, func: Func, args: Vec<Fragment>) -> Result<Fragment> {
        use Func::*;

        func.check_arity(args.len())?;
        let pg = self.is_postgresql();

        let number = |sql: String| Ok::<_, Error>(Fragment::new(sql, Ty::Number));
        let text = |sql: String| Ok::<_, Error>(Fragment::new(sql, Ty::Text));
        let boolean = |sql: String| Ok::<_, Error>(Fragment::new(sql, Ty::Boolean));

        match func {
            // Numeric
            Sum => number(self.sum(&args)?),
            Average => {
                let sum = self.sum(&args)?;
                let count = args
                    .iter()
                    .map(|arg| format!("CASE WHEN {} IS NULL THEN 0 ELSE 1 END", arg.sql))
                    .collect::<Vec<_>>()
                    .join(" + ");
                number(match self.flavor() {
                    Flavor::Postgresql => {
                        format!("(({sum})::double precision / NULLIF({count}, 0))")
                    }
                    Flavor::Sqlite => format!("(CAST({sum} AS REAL) / NULLIF({count}, 0))"),
                })
            }
            Max | Min => number(self.extreme(func == Max, &args)?),
            Round => {
                let x = self.num(&args[0])?;
                let digits = self.digits(args.get(1))?;
                number(match self.flavor() {
                    Flavor::Postgresql => {
                        format!("ROUND(({x})::numeric, {digits})::double precision")
                    }
                    Flavor::Sqlite => format!("ROUND({x}, {digits})"),
                })
            }
            RoundUp | RoundDown => number(self.round_directed(func == RoundUp, &args)?),
            Ceiling | Floor | Int => {
                let x = self.num(&args[0])?;
                let up = func == Ceiling;
                number(match self.flavor() {
                    Flavor::Postgresql if up => format!("CEIL({x})"),
                    Flavor::Postgresql => format!("FLOOR({x})"),
                    // CAST truncates toward zero; adjust by one where that
                    // went the wrong way.
                    Flavor::Sqlite if up => format!(
                        "(CAST({x} AS INTEGER) + ({x} > CAST({x} AS INTEGER)))"
                    ),
                    Flavor::Sqlite => format!(
                        "(CAST({x} AS INTEGER) - ({x} < CAST({x} AS INTEGER)))"
                    ),
                })
            }
            Abs => number(format!("ABS({})", self.num(&args[0])?)),
            Sqrt => number(format!("SQRT({})", self.num(&args[0])?)),
            Power => number(format!(
                "POWER({}, {})",
                self.num(&args[0])?,
                self.num(&args[1])?
            )),
            Exp => number(format!("EXP({})", self.num(&args[0])?)),
            Log => {
                let x = self.num(&args[0])?;
                match args.get(1) {
                    Some(base) => number(format!("(LN({x}) / LN({}))", self.num(base)?)),
                    None => number(format!("LOG10({x})")),
                }
            }
            Mod => self.modulo(&args[0], &args[1]),
            Value => number(self.num(&args[0])?),

            // Text
            Concatenate => self.concat(&args),
            Left => {
                let s = self.text(&args[0])?;
                let n = self.count(args.get(1))?;
                text(match self.flavor() {
                    Flavor::Postgresql => format!("LEFT({s}, {n})"),
                    Flavor::Sqlite => format!("SUBSTR({s}, 1, {n})"),
                })
            }
            Right => {
                let s = self.text(&args[0])?;
                let n = self.count(args.get(1))?;
                let literal = args.get(1).map_or(Some(1), |arg| arg.as_int());
                text(match (self.flavor(), literal) {
                    (_, Some(k)) if k <= 0 => "''".to_string(),
                    (Flavor::Postgresql, Some(_)) => format!("RIGHT({s}, {n})"),
                    (Flavor::Postgresql, None) => {
                        format!("(CASE WHEN {n} > 0 THEN RIGHT({s}, {n}) ELSE '' END)")
                    }
                    // Signed offsets count from the end of the string.
                    (Flavor::Sqlite, Some(k)) => format!("SUBSTR({s}, -{k})"),
                    (Flavor::Sqlite, None) => {
                        format!("(CASE WHEN {n} > 0 THEN SUBSTR({s}, -({n})) ELSE '' END)")
                    }
                })
            }
            Mid => {
                let s = self.text(&args[0])?;
                let start = self.int(&args[1])?;
                let len = self.int(&args[2])?;
                text(match self.flavor() {
                    Flavor::Postgresql => format!("SUBSTRING({s} FROM {start} FOR {len})"),
                    Flavor::Sqlite => format!("SUBSTR({s}, {start}, {len})"),
                })
            }
            Len => {
                let s = self.text(&args[0])?;
                number(match self.flavor() {
                    Flavor::Postgresql => format!("CHAR_LENGTH({s})"),
                    Flavor::Sqlite => format!("LENGTH({s})"),
                })
            }
            Upper => text(format!("UPPER({})", self.text(&args[0])?)),
            Lower => text(format!("LOWER({})", self.text(&args[0])?)),
            Trim => text(format!("TRIM({})", self.text(&args[0])?)),
            Substitute => text(format!(
                "REPLACE({}, {}, {})",
                self.text(&args[0])?,
                self.text(&args[1])?,
                self.text(&args[2])?
            )),
            Find => {
                let needle = self.text(&args[0])?;
                let haystack = self.text(&args[1])?;
                let position = |haystack: &str| match self.flavor() {
                    Flavor::Postgresql => format!("POSITION({needle} IN {haystack})"),
                    Flavor::Sqlite => format!("INSTR({haystack}, {needle})"),
                };
                match args.get(2) {
                    None => number(position(&haystack)),
                    Some(start) => {
                        let start = self.int(start)?;
                        let tail = match self.flavor() {
                            Flavor::Postgresql => format!("SUBSTRING({haystack} FROM {start})"),
                            Flavor::Sqlite => format!("SUBSTR({haystack}, {start})"),
                        };
                        let found = position(&tail);
                        number(format!(
                            "(CASE WHEN {found} = 0 THEN 0 ELSE {found} + {start} - 1 END)"
                        ))
                    }
                }
            }
            Rept => {
                let s = self.text(&args[0])?;
                let n = self.int(&args[1])?;
                text(match self.flavor() {
                    Flavor::Postgresql => format!("REPEAT({s}, {n})"),
                    Flavor::Sqlite => format!("REPLACE(HEX(ZEROBLOB({n})), '00', {s})"),
                })
            }
            T => match args[0].ty {
                Ty::Text => text(args[0].sql.clone()),
                _ => text("NULL".to_string()),
            },

            // Logical
            If => {
                let cond = self.truthy(&args[0]);
                let branches = match args.get(2) {
                    Some(otherwise) => vec![args[1].clone(), otherwise.clone()],
                    None => vec![args[1].clone(), self.null()],
                };
                let (sql, ty) = self.unify(&branches)?;
                Ok(Fragment::new(
                    format!("CASE WHEN {cond} THEN {} ELSE {} END", sql[0], sql[1]),
                    ty,
                ))
            }
            And | Or => {
                let op = if func == And { " AND " } else { " OR " };
                let operands: Vec<_> = args.iter().map(|arg| self.truthy(arg)).collect();
                boolean(format!("({})", operands.join(op)))
            }
            Not => boolean(format!("(NOT {})", self.truthy(&args[0]))),
            Xor => {
                let ones: Vec<_> = args
                    .iter()
                    .map(|arg| format!("CASE WHEN {} THEN 1 ELSE 0 END", self.truthy(arg)))
                    .collect();
                boolean(format!("((({}) % 2) = 1)", ones.join(" + ")))
            }
            Switch => self.switch(&args),
            Blank => Ok(self.null()),

            // Date and time
            Now => Ok(self.now(false)),
            Today => Ok(self.now(true)),
            Year | Month | Day | Hour | Minute | Second | Weekday => {
                let d = self.timestamp(&args[0], func.name())?;
                number(match self.flavor() {
                    Flavor::Postgresql => {
                        let part = match func {
                            Year => "YEAR",
                            Month => "MONTH",
                            Day => "DAY",
                            Hour => "HOUR",
                            Minute => "MINUTE",
                            Second => "SECOND",
                            _ => "DOW",
                        };
                        let extract = format!("EXTRACT({part} FROM ({d}) AT TIME ZONE 'UTC')");
                        if func == Second {
                            format!("FLOOR({extract})::double precision")
                        } else {
                            format!("{extract}::double precision")
                        }
                    }
                    Flavor::Sqlite => {
                        let format = match func {
                            Year => "%Y",
                            Month => "%m",
                            Day => "%d",
                            Hour => "%H",
                            Minute => "%M",
                            Second => "%S",
                            _ => "%w",
                        };
                        format!("CAST(STRFTIME('{format}', {d}) AS REAL)")
                    }
                })
            }
            DatetimeDiff => {
                let a = self.timestamp(&args[0], func.name())?;
                let b = self.timestamp(&args[1], func.name())?;
                let unit = match args.get(2) {
                    None => 86400.0,
                    Some(arg) => {
                        let name = arg.as_str().ok_or_else(|| {
                            Error::invalid_formula("DATETIME_DIFF unit must be a string literal")
                        })?;
                        unit_seconds(name)?
                    }
                };
                number(match self.flavor() {
                    Flavor::Postgresql => format!(
                        "TRUNC(EXTRACT(EPOCH FROM ({a}) - ({b})) / {unit})::double precision"
                    ),
                    Flavor::Sqlite => format!(
                        "CAST(ROUND((JULIANDAY({a}) - JULIANDAY({b})) * 86400.0 / {unit}, 6) AS INTEGER)"
                    ),
                })
            }

            // Arrays
            CountAll => {
                let x = &args[0].sql;
                number(match (args[0].ty, self.flavor()) {
                    (Ty::Json, Flavor::Postgresql) => format!("COALESCE(jsonb_array_length({x}), 0)"),
                    (Ty::Json, Flavor::Sqlite) => format!("COALESCE(JSON_ARRAY_LENGTH({x}), 0)"),
                    _ => format!("(CASE WHEN {x} IS NULL THEN 0 ELSE 1 END)"),
                })
            }
            ArrayJoin => {
                if args[0].ty != Ty::Json {
                    return text(self.text(&args[0])?);
                }
                if self.is_generated() {
                    return Err(self.unsupported(func.name()));
                }
                let x = &args[0].sql;
                let sep = match args.get(1) {
                    Some(sep) => self.text(sep)?,
                    None => string_literal(", "),
                };
                text(if pg {
                    format!(
                        "(SELECT STRING_AGG(CASE WHEN jsonb_typeof(e) = 'object' THEN e ->> 'title' ELSE e #>> '{{}}' END, {sep}) FROM jsonb_array_elements({x}) AS e)"
                    )
                } else {
                    format!(
                        "(SELECT GROUP_CONCAT(CASE WHEN json_type(j.value) = 'object' THEN json_extract(j.value, '$.title') ELSE j.value END, {sep}) FROM json_each({x}) AS j)"
                    )
                })
            }

            // System
            RecordId => text(self.ident(ID_COLUMN)),
        }
    }

    /// `NULL`s count as zero.
    fn sum(&self, args: &[Fragment]) -> Result<String> {
        let terms = args
            .iter()
            .map(|arg| {
                let x = self.num(arg)?;
                Ok(if arg.literal.is_some() {
                    x
                } else {
                    format!("COALESCE({x}, 0)")
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({})", terms.join(" + ")))
    }

    /// Greatest or least non-null argument.
    fn extreme(&self, max: bool, args: &[Fragment]) -> Result<String> {
        let values = args
            .iter()
            .map(|arg| self.num(arg))
            .collect::<Result<Vec<_>>>()?;

        if values.len() == 1 {
            return Ok(values[0].clone());
        }

        Ok(match self.flavor() {
            Flavor::Postgresql => {
                let name = if max { "GREATEST" } else { "LEAST" };
                format!("{name}({})", values.join(", "))
            }
            Flavor::Sqlite => {
                // Scalar MAX/MIN return NULL as soon as one argument is NULL.
                // Replacing each argument by the first non-null one starting
                // at its own position never changes the result.
                let name = if max { "MAX" } else { "MIN" };
                let rotated: Vec<_> = (0..values.len())
                    .map(|i| {
                        let order: Vec<_> = values[i..]
                            .iter()
                            .chain(&values[..i])
                            .map(String::as_str)
                            .collect();
                        format!("COALESCE({})", order.join(", "))
                    })
                    .collect();
                format!("{name}({})", rotated.join(", "))
            }
        })
    }

    /// ROUNDUP rounds away from zero, ROUNDDOWN toward zero.
    fn round_directed(&self, up: bool, args: &[Fragment]) -> Result<String> {
        let x = self.num(&args[0])?;
        let digits = self.digits(args.get(1))?;

        Ok(match self.flavor() {
            Flavor::Postgresql if up => format!(
                "(SIGN(({x})::numeric) * CEIL(ABS(({x})::numeric) * POWER(10::numeric, {digits})) / POWER(10::numeric, {digits}))::double precision"
            ),
            Flavor::Postgresql => format!("TRUNC(({x})::numeric, {digits})::double precision"),
            Flavor::Sqlite => {
                let factor = match args.get(1).map_or(Some(0), |arg| arg.as_int()) {
                    Some(k) if (-15..=15).contains(&k) => format!("{:.1}", 10f64.powi(k as i32)),
                    _ => format!("POWER(10.0, {digits})"),
                };
                // Scaled values are rounded to nine places first so binary
                // noise (1.1 * 10 = 11.000000000000002) does not move the
                // result.
                if up {
                    let scaled = format!("ROUND(ABS({x}) * {factor}, 9)");
                    format!(
                        "((({x} > 0) - ({x} < 0)) * (CAST({scaled} AS INTEGER) + ({scaled} > CAST({scaled} AS INTEGER))) / {factor})"
                    )
                } else {
                    format!("(CAST(ROUND({x} * {factor}, 9) AS INTEGER) / {factor})")
                }
            }
        })
    }

    fn switch(&self, args: &[Fragment]) -> Result<Fragment> {
        let subject = &args[0].sql;
        let rest = &args[1..];
        let (pairs, default) = if rest.len() % 2 == 1 {
            (&rest[..rest.len() - 1], rest.last())
        } else {
            (rest, None)
        };

        let mut branches: Vec<Fragment> = pairs.iter().skip(1).step_by(2).cloned().collect();
        branches.push(default.cloned().unwrap_or_else(|| self.null()));
        let (results, ty) = self.unify(&branches)?;

        let mut sql = format!("CASE {subject}");
        for (i, result) in results[..results.len() - 1].iter().enumerate() {
            sql.push_str(&format!(" WHEN {} THEN {result}", pairs[i * 2].sql));
        }
        sql.push_str(&format!(" ELSE {} END", results[results.len() - 1]));

        Ok(Fragment::new(sql, ty))
    }

    /// Digit count argument for the rounding functions, defaulting to zero.
    fn digits(&self, arg: Option<&Fragment>) -> Result<String> {
        match arg {
            Some(arg) => self.int(arg),
            None => Ok("0".to_string()),
        }
    }

    /// Character count argument, defaulting to one.
    fn count(&self, arg: Option<&Fragment>) -> Result<String> {
        match arg {
            Some(arg) => self.int(arg),
            None => Ok("1".to_string()),
        }
    }
}

fn unit_seconds(name: &str) -> Result<f64> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "millisecond" | "milliseconds" | "ms" => 0.001,
        "second" | "seconds" | "s" => 1.0,
        "minute" | "minutes" | "m" => 60.0,
        "hour" | "hours" | "h" => 3600.0,
        "day" | "days" | "d" => 86400.0,
        "week" | "weeks" | "w" => 604800.0,
        _ => {
            return Err(Error::invalid_formula(format!(
                "unknown DATETIME_DIFF unit \"{name}\""
            )))
        }
    })
}
