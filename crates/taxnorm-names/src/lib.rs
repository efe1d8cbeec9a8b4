//! Scientific name parsing.
//!
//! A deliberately small grammar covering the names that actually occur in
//! denormalized checklist data: an uninomial, a binomial, or a trinomial
//! with an optional infraspecific rank marker, followed by free-text
//! authorship. Anything fancier (hybrid signs, cultivars, virus names) is
//! rejected rather than guessed at.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::multispace1,
    combinator::{opt, verify},
    sequence::{pair, preceded, terminated},
    IResult,
};
use taxnorm_core::interpret::{InterpretedName, NameInterpreter, UnparsableName};

/// Infraspecific rank markers recognized between the specific and the
/// infraspecific epithet, e.g. `Aus bus subsp. cus`.
const RANK_MARKERS: [&str; 6] = ["subsp.", "ssp.", "subvar.", "var.", "forma", "f."];

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-'
}

fn name_word(input: &str) -> IResult<&str, &str> {
    take_while1(is_word_char)(input)
}

/// A word led by an uppercase letter: a genus or a misplaced higher taxon.
fn capitalized_word(input: &str) -> IResult<&str, &str> {
    verify(name_word, |w: &str| {
        w.starts_with(|c: char| c.is_ascii_uppercase())
    })(input)
}

/// An all-lowercase word of at least two letters: an epithet.
fn epithet(input: &str) -> IResult<&str, &str> {
    verify(name_word, |w: &str| {
        w.len() >= 2 && w.chars().all(|c| c.is_ascii_lowercase() || c == '-')
    })(input)
}

fn rank_marker(input: &str) -> IResult<&str, &str> {
    alt((
        tag(RANK_MARKERS[0]),
        tag(RANK_MARKERS[1]),
        tag(RANK_MARKERS[2]),
        tag(RANK_MARKERS[3]),
        tag(RANK_MARKERS[4]),
        tag(RANK_MARKERS[5]),
    ))(input)
}

/// The structural part of a name: uninomial, binomial, or trinomial with
/// an optional rank marker. The unconsumed remainder is the authorship.
fn name_structure(input: &str) -> IResult<&str, (&str, Option<&str>, Option<&str>, Option<&str>)> {
    let (input, genus) = capitalized_word(input)?;
    let (input, species) = opt(preceded(multispace1, epithet))(input)?;
    if species.is_none() {
        return Ok((input, (genus, None, None, None)));
    }
    // marked trinomial first, then a bare one
    let (input, marked) = opt(preceded(
        multispace1,
        pair(terminated(rank_marker, multispace1), epithet),
    ))(input)?;
    let (input, marker, infra) = match marked {
        Some((marker, infra)) => (input, Some(marker), Some(infra)),
        None => {
            let (input, bare) = opt(preceded(multispace1, epithet))(input)?;
            (input, None, bare)
        }
    };
    Ok((input, (genus, species, marker, infra)))
}

/// The default [`NameInterpreter`] implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScientificNameParser;

impl ScientificNameParser {
    pub fn new() -> Self {
        ScientificNameParser
    }
}

impl NameInterpreter for ScientificNameParser {
    fn interpret(&self, name: &str) -> Result<InterpretedName, UnparsableName> {
        let trimmed = name.trim();
        let (rest, (genus, species, marker, infra)) =
            name_structure(trimmed).map_err(|_| UnparsableName {
                name: name.to_string(),
            })?;

        // authorship must start at a token boundary
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return Err(UnparsableName {
                name: name.to_string(),
            });
        }
        let rest = rest.trim();
        let authorship = (!rest.is_empty()).then(|| rest.to_string());

        let mut full_name = String::from(genus);
        for part in [species, marker, infra, authorship.as_deref()]
            .into_iter()
            .flatten()
        {
            full_name.push(' ');
            full_name.push_str(part);
        }

        Ok(InterpretedName {
            genus_or_above: Some(genus.to_string()),
            specific_epithet: species.map(str::to_string),
            infraspecific_epithet: infra.map(str::to_string),
            authorship,
            full_name,
            is_binomial: species.is_some() && infra.is_none(),
        })
    }
}
