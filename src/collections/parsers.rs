use super::nodeset::NodeSet;
use super::pattern::{Pattern, Skeleton};
use crate::error::{Error, ParseError, ParseErrorKind};
use crate::rangeset::{ParseOptions, RangeSet, RangeStep};
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1};
use nom::combinator::opt;
use nom::multi::separated_list1;
use nom::sequence::{pair, preceded};
use nom::IResult;

/// Parser-internal error: a position in the input plus an optional
/// explicit fragment for semantic failures.
#[derive(Debug)]
struct GrammarError<'a> {
    input: &'a str,
    kind: ParseErrorKind,
    fragment: Option<String>,
}

impl<'a> nom::error::ParseError<&'a str> for GrammarError<'a> {
    fn from_error_kind(input: &'a str, _: nom::error::ErrorKind) -> Self {
        Self {
            input,
            kind: ParseErrorKind::Syntax,
            fragment: None,
        }
    }

    fn append(_: &'a str, _: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, GrammarError<'a>>;

fn fail<'a>(input: &'a str, kind: ParseErrorKind, fragment: &str) -> nom::Err<GrammarError<'a>> {
    nom::Err::Failure(GrammarError {
        input,
        kind,
        fragment: Some(fragment.to_string()),
    })
}

/// Converts a grammar error into a public error. `base` must be the
/// string the failing parser was started on so byte offsets line up.
fn to_parse_error(base: &str, e: nom::Err<GrammarError>) -> ParseError {
    match e {
        nom::Err::Error(g) | nom::Err::Failure(g) => {
            let offset = base.len() - g.input.len();
            let fragment = g.fragment.unwrap_or_else(|| head_fragment(g.input));
            ParseError::new(g.kind, fragment, offset)
        }
        nom::Err::Incomplete(_) => ParseError::new(ParseErrorKind::Syntax, "", base.len()),
    }
}

/// First few characters at an error position, up to a token boundary.
fn head_fragment(s: &str) -> String {
    s.chars()
        .take(24)
        .take_while(|c| !c.is_whitespace())
        .collect()
}

fn is_padded(s: &str) -> bool {
    s.starts_with('0') && s != "0"
}

/// One `N`, `N-M` or `N-M/S` term.
fn range_step(i: &str) -> PResult<'_, RangeStep> {
    let (rest, (start_s, tail)) = pair(
        digit1,
        opt(pair(
            preceded(char('-'), digit1),
            opt(preceded(char('/'), digit1)),
        )),
    )(i)?;
    let consumed = &i[..i.len() - rest.len()];
    let semantic = |kind| fail(i, kind, consumed);

    let start: u32 = start_s
        .parse()
        .map_err(|_| semantic(ParseErrorKind::Overflow))?;

    let mut pad = 0;
    let (end, step) = match tail {
        None => {
            if is_padded(start_s) {
                pad = start_s.len() as u32;
            }
            (start, 1)
        }
        Some((end_s, step_s)) => {
            if is_padded(start_s) || is_padded(end_s) {
                if start_s.len() != end_s.len() {
                    return Err(semantic(ParseErrorKind::PaddingMismatch));
                }
                pad = start_s.len() as u32;
            }
            let end: u32 = end_s
                .parse()
                .map_err(|_| semantic(ParseErrorKind::Overflow))?;
            if end < start {
                return Err(semantic(ParseErrorKind::ReversedRange));
            }
            let step = match step_s {
                None => 1,
                Some(s) => s
                    .parse::<u32>()
                    .map_err(|_| semantic(ParseErrorKind::Overflow))?,
            };
            if step == 0 {
                return Err(semantic(ParseErrorKind::InvalidStep));
            }
            (end, step)
        }
    };

    Ok((
        rest,
        RangeStep {
            start,
            end,
            step,
            pad,
        },
    ))
}

/// `[terms]` with at least one term. Errors inside brackets are final,
/// not backtrack points.
fn bracketed_ranges(i: &str) -> PResult<'_, Vec<RangeStep>> {
    let (after_open, _) = char('[')(i)?;
    if after_open.starts_with(']') {
        return Err(fail(i, ParseErrorKind::EmptyRange, "[]"));
    }

    let (rest, ranges) =
        separated_list1(char(','), range_step)(after_open).map_err(promote_in_brackets)?;

    match char::<_, GrammarError>(']')(rest) {
        Ok((rest, _)) => Ok((rest, ranges)),
        Err(_) => {
            let kind = if rest.starts_with('[')
                || rest.strip_prefix(',').is_some_and(|r| r.starts_with('['))
            {
                ParseErrorKind::NestedBrackets
            } else if rest.is_empty() {
                ParseErrorKind::UnbalancedBrackets
            } else {
                ParseErrorKind::Syntax
            };
            Err(nom::Err::Failure(GrammarError {
                input: rest,
                kind,
                fragment: None,
            }))
        }
    }
}

fn promote_in_brackets(e: nom::Err<GrammarError>) -> nom::Err<GrammarError> {
    match e {
        nom::Err::Error(g) => {
            let kind = if g.input.starts_with('[') {
                ParseErrorKind::NestedBrackets
            } else if g.input.is_empty() {
                ParseErrorKind::UnbalancedBrackets
            } else {
                g.kind
            };
            nom::Err::Failure(GrammarError { kind, ..g })
        }
        other => other,
    }
}

/// A bare digit run becomes a singleton slot, keeping its padding.
fn digit_run(i: &str) -> PResult<'_, RangeStep> {
    let (rest, d) = digit1(i)?;
    let value: u32 = d.parse().map_err(|_| fail(i, ParseErrorKind::Overflow, d))?;
    let pad = if is_padded(d) { d.len() as u32 } else { 0 };
    Ok((
        rest,
        RangeStep {
            start: value,
            end: value,
            step: 1,
            pad,
        },
    ))
}

fn is_literal_char(c: char) -> bool {
    !c.is_ascii_digit() && !c.is_whitespace() && !['[', ']', ','].contains(&c)
}

fn at_token_boundary(s: &str) -> bool {
    s.is_empty() || s.starts_with(',') || s.starts_with(char::is_whitespace)
}

enum Component<'a> {
    Literal(&'a str),
    Slot(Vec<RangeStep>),
}

/// One whitespace/comma-delimited pattern: literal runs, bracketed range
/// groups and bare digit runs. A token that is exactly one range term
/// (`0-10/2`) stands for a bare range with an empty literal template.
fn pattern_token(i: &str) -> PResult<'_, Vec<Component<'_>>> {
    if i.starts_with(|c: char| c.is_ascii_digit()) {
        match range_step(i) {
            Ok((rest, rs)) if at_token_boundary(rest) => {
                return Ok((rest, vec![Component::Slot(vec![rs])]))
            }
            // A bad term is only a range error when it spans the whole
            // token; `9-2x` is an ordinary name and the component loop
            // below re-parses it.
            Err(nom::Err::Failure(g)) => {
                let consumed = g.fragment.as_deref().map_or(0, str::len);
                if at_token_boundary(&i[consumed..]) {
                    return Err(nom::Err::Failure(g));
                }
            }
            _ => {}
        }
    }

    let mut comps = Vec::new();
    let mut rest = i;
    let mut last_slot = false;
    loop {
        if let Ok((r, lit)) = take_while1::<_, _, GrammarError>(is_literal_char)(rest) {
            comps.push(Component::Literal(lit));
            rest = r;
            last_slot = false;
            continue;
        }
        if rest.starts_with('[') {
            if last_slot {
                return Err(fail(rest, ParseErrorKind::Syntax, &head_fragment(rest)));
            }
            let (r, ranges) = bracketed_ranges(rest)?;
            comps.push(Component::Slot(ranges));
            rest = r;
            last_slot = true;
            continue;
        }
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            if last_slot {
                return Err(fail(rest, ParseErrorKind::Syntax, &head_fragment(rest)));
            }
            let (r, step) = digit_run(rest)?;
            comps.push(Component::Slot(vec![step]));
            rest = r;
            last_slot = true;
            continue;
        }
        break;
    }

    if comps.is_empty() {
        let kind = if rest.starts_with(']') {
            ParseErrorKind::UnbalancedBrackets
        } else {
            ParseErrorKind::Syntax
        };
        return Err(nom::Err::Error(GrammarError {
            input: rest,
            kind,
            fragment: None,
        }));
    }
    Ok((rest, comps))
}

fn build_pattern(comps: Vec<Component>, opts: &ParseOptions) -> Result<Pattern, Error> {
    let mut parts = Vec::new();
    let mut slots = Vec::new();
    let mut lit = String::new();

    for c in comps {
        match c {
            Component::Literal(s) => lit.push_str(s),
            Component::Slot(ranges) => {
                parts.push(std::mem::take(&mut lit));
                let mut rs = RangeSet::new();
                for r in &ranges {
                    let requested = rs.len().saturating_add(r.members());
                    if requested > opts.max_members {
                        return Err(Error::ResourceLimit {
                            requested,
                            max: opts.max_members,
                        });
                    }
                    rs.push_step(r);
                }
                slots.push(rs);
            }
        }
    }

    let suffix = (!lit.is_empty()).then_some(lit);
    Ok(Pattern::new(Skeleton::new(parts, suffix), slots))
}

/// Parses a whole node set expression: pattern tokens separated by commas
/// and/or whitespace.
pub(crate) fn node_set_expr(input: &str, opts: &ParseOptions) -> Result<NodeSet, Error> {
    let mut ns = NodeSet::new().with_autostep(opts.autostep);
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let (r, comps) = pattern_token(rest).map_err(|e| to_parse_error(input, e))?;
        if !at_token_boundary(r) {
            let kind = if r.starts_with(']') {
                ParseErrorKind::UnbalancedBrackets
            } else {
                ParseErrorKind::Syntax
            };
            return Err(ParseError::new(kind, head_fragment(r), input.len() - r.len()).into());
        }

        let pattern = build_pattern(comps, opts)?;
        ns.insert_pattern(pattern, opts.max_members)?;
        rest = r;
    }

    Ok(ns)
}

/// Parses a bare range set: comma-separated terms only.
pub(crate) fn range_set_expr(input: &str, opts: &ParseOptions) -> Result<RangeSet, Error> {
    let mut rs = RangeSet::new().with_autostep(opts.autostep);
    let s = input.trim_start();
    if s.trim_end().is_empty() {
        return Ok(rs);
    }
    let base = input.len() - s.len();

    let (rest, steps) = separated_list1(char(','), range_step)(s)
        .map_err(|e| to_parse_error(s, e).at_offset(base))?;

    let rest = rest.trim_start();
    if !rest.is_empty() {
        return Err(ParseError::new(
            ParseErrorKind::Syntax,
            head_fragment(rest),
            base + (s.len() - rest.len()),
        )
        .into());
    }

    for st in &steps {
        let requested = rs.len().saturating_add(st.members());
        if requested > opts.max_members {
            return Err(Error::ResourceLimit {
                requested,
                max: opts.max_members,
            });
        }
        rs.push_step(st);
    }

    Ok(rs)
}
