//! Line commands for the interactive `browse` view.

use estate_core::{PerPage, PropertyId, PropertyStatus, PropertyType, QueryAction, SortBy, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Query(QueryAction),
    Refresh,
    Show(PropertyId),
    Delete(PropertyId),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  search <text>          filter by title (empty clears)
  city <text>            filter by city (empty clears)
  type <kind|any>        apartment, house, villa, office, land
  status <status|any>    available, sold, rented, pending
  sort <field>           created_at, price, area, title
  order <asc|desc>
  per-page <5|10|20|50>
  page <n> | next | prev
  show <id> | delete <id>
  refresh | help | quit";

/// Parse one line of input. Empty input maps to `Refresh`.
pub fn parse(line: &str) -> Result<BrowseCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" | "refresh" | "r" => BrowseCommand::Refresh,
        "search" | "s" => BrowseCommand::Query(QueryAction::SetSearch(rest.to_string())),
        "city" => BrowseCommand::Query(QueryAction::SetCity(rest.to_string())),
        "type" => BrowseCommand::Query(QueryAction::SetPropertyType(optional::<PropertyType>(rest)?)),
        "status" => BrowseCommand::Query(QueryAction::SetStatus(optional::<PropertyStatus>(rest)?)),
        "sort" => BrowseCommand::Query(QueryAction::SetSortBy(required::<SortBy>(rest)?)),
        "order" => BrowseCommand::Query(QueryAction::SetOrder(required::<SortOrder>(rest)?)),
        "per-page" | "pp" => BrowseCommand::Query(QueryAction::SetPerPage(required::<PerPage>(rest)?)),
        "page" | "p" => BrowseCommand::Query(QueryAction::SetPage(required::<u32>(rest)?)),
        "next" | "n" => BrowseCommand::Query(QueryAction::NextPage),
        "prev" => BrowseCommand::Query(QueryAction::PrevPage),
        "show" => BrowseCommand::Show(required::<PropertyId>(rest)?),
        "delete" | "rm" => BrowseCommand::Delete(required::<PropertyId>(rest)?),
        "help" | "?" => BrowseCommand::Help,
        "quit" | "q" | "exit" => BrowseCommand::Quit,
        other => return Err(format!("unknown command `{other}`, try `help`")),
    };
    Ok(command)
}

fn required<T>(arg: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if arg.is_empty() {
        return Err("missing argument".to_string());
    }
    arg.parse().map_err(|e: T::Err| e.to_string())
}

/// `any` or nothing clears the filter.
fn optional<T>(arg: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if arg.is_empty() || arg.eq_ignore_ascii_case("any") {
        return Ok(None);
    }
    required(arg).map(Some)
}
