//! `@PG` chaining for output headers.
//!
//! The trimmed BAM keeps the input header and gains one `@PG` line whose `PP` points at the
//! last program already in the chain.

use anyhow::Result;
use bstr::BString;
use noodles::sam::Header;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::Program;
use noodles::sam::header::record::value::map::program::tag;
use std::collections::HashSet;

/// Name and base ID of the `@PG` records this program adds.
pub const PROGRAM_NAME: &str = "fgtrim";

/// ID of the program at the end of the `@PG` chain, i.e. one no other program names as `PP`.
#[must_use]
pub fn last_program_id(header: &Header) -> Option<String> {
    let programs = header.programs();
    let programs = programs.as_ref();

    let referenced: HashSet<&[u8]> = programs
        .values()
        .filter_map(|pg| pg.other_fields().get(&tag::PREVIOUS_PROGRAM_ID))
        .map(|pp| pp.as_slice())
        .collect();

    programs
        .keys()
        .find(|id| !referenced.contains(id.as_slice()))
        .or_else(|| programs.keys().next())
        .map(|id| String::from_utf8_lossy(id).into_owned())
}

/// `base_id`, or `base_id.N` with the smallest `N` not already used as a program ID.
#[must_use]
pub fn unique_program_id(header: &Header, base_id: &str) -> String {
    let programs = header.programs();
    let taken = |id: &str| programs.as_ref().contains_key(id.as_bytes());

    if !taken(base_id) {
        return base_id.to_string();
    }
    (1..)
        .map(|i| format!("{base_id}.{i}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base_id.to_string())
}

/// Appends this program's `@PG` record to `header`, chained to the previous last program.
///
/// # Errors
///
/// Returns an error if the record cannot be built or added.
pub fn add_pg_record(mut header: Header, version: &str, command_line: &str) -> Result<Header> {
    let id = unique_program_id(&header, PROGRAM_NAME);

    let mut builder = Map::<Program>::builder()
        .insert(tag::NAME, PROGRAM_NAME)
        .insert(tag::VERSION, version)
        .insert(tag::COMMAND_LINE, command_line);
    if let Some(previous) = last_program_id(&header) {
        builder = builder.insert(tag::PREVIOUS_PROGRAM_ID, previous);
    }

    header.programs_mut().add(BString::from(id), builder.build()?)?;
    Ok(header)
}
