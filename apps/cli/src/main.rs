use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::pagination::MAX_VISIBLE_PAGES;
use client_core::{
    build_search_request, compute_window, load_settings, DemographyClient, ListQuery,
    PeopleClient,
};
use shared::domain::{Country, EyeColor, HairColor, NewPerson, PersonId, PersonPatch};
use shared::protocol::{
    FilterClause, FilterOperator, LocationSelector, PageState, SearchOutcome, SortOrder, SortSpec,
};

#[derive(Parser, Debug)]
#[command(
    name = "people-console",
    about = "Console client for the people and demography collection services"
)]
struct Cli {
    /// Base URL of the people service (defaults to the router).
    #[arg(long)]
    people_url: Option<String>,
    /// Base URL of the demography service (defaults to the router).
    #[arg(long)]
    demography_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List people with optional filters, sort, and paging.
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
        #[arg(long, default_value = "id")]
        sort_by: String,
        #[arg(long, default_value = "asc")]
        sort_order: String,
        /// Repeatable, e.g. --filter name=Ada --filter nationality=ITALY
        #[arg(long = "filter", value_name = "NAME=VALUE")]
        filters: Vec<String>,
    },
    /// Advanced search; providing a callback URL makes it asynchronous.
    Search {
        /// Repeatable clause, e.g. --where height:gte:170
        #[arg(long = "where", value_name = "FIELD:OP:VALUE")]
        clauses: Vec<String>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long, default_value = "asc")]
        sort_order: String,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
        #[arg(long)]
        callback_url: Option<String>,
    },
    /// Fetch one person by id.
    Get { id: i64 },
    /// Create a person from a JSON payload file.
    Create { file: PathBuf },
    /// Patch a person from a JSON file holding only the changed fields.
    Update { id: i64, file: PathBuf },
    /// Delete one person by id.
    Delete { id: i64 },
    /// Delete every person with the given nationality.
    DeleteNationality { nationality: String },
    /// Delete one person at an exact location.
    DeleteLocation {
        #[arg(long)]
        x: Option<i64>,
        #[arg(long)]
        y: Option<i64>,
        #[arg(long)]
        z: Option<i64>,
    },
    /// People whose location coordinates all exceed the given values.
    CompareLocation {
        #[arg(long)]
        x: Option<i64>,
        #[arg(long)]
        y: Option<i64>,
        #[arg(long)]
        z: Option<i64>,
    },
    /// Demographic statistics across all known categories.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(url) = cli.people_url {
        settings.people_base_url = url;
    }
    if let Some(url) = cli.demography_url {
        settings.demography_base_url = url;
    }
    let people = PeopleClient::new(settings.people_base_url);

    match cli.command {
        Command::List {
            page,
            page_size,
            sort_by,
            sort_order,
            filters,
        } => {
            let filters = filters
                .iter()
                .map(|raw| parse_filter(raw))
                .collect::<Result<Vec<_>>>()?;
            let query = ListQuery {
                page,
                page_size,
                sort_by,
                sort_order: parse_sort_order(&sort_order)?,
                filters,
            };
            let result = people.list(&query).await?;
            println!("{}", serde_json::to_string_pretty(&result.people)?);
            println!(
                "page {} of {} ({} people total)",
                page + 1,
                result.total_pages,
                result.total_count
            );
            let window = compute_window(page, result.total_pages, MAX_VISIBLE_PAGES);
            if !window.pages.is_empty() {
                let run = window
                    .pages
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                println!(
                    "pages: {}{run}{}",
                    if window.show_first { "<< " } else { "" },
                    if window.show_last { " >>" } else { "" }
                );
            }
        }
        Command::Search {
            clauses,
            sort_by,
            sort_order,
            page,
            page_size,
            callback_url,
        } => {
            let clauses = clauses
                .iter()
                .map(|raw| parse_clause(raw))
                .collect::<Result<Vec<_>>>()?;
            let sort = sort_by.map(|field| {
                Ok::<_, anyhow::Error>(SortSpec {
                    field,
                    order: parse_sort_order(&sort_order)?,
                })
            });
            let sort = sort.transpose()?;
            let request = build_search_request(
                &clauses,
                sort,
                PageState {
                    index: page,
                    size: page_size,
                },
                callback_url.as_deref(),
            );
            match people.search(&request).await? {
                SearchOutcome::Sync(result) => {
                    println!("{}", serde_json::to_string_pretty(&result.people)?);
                    println!("{} matches", result.total_count);
                }
                SearchOutcome::Accepted(accepted) => {
                    println!(
                        "search task accepted: {}; results will be delivered to the callback URL",
                        accepted.task_id
                    );
                    if let Some(eta) = accepted.estimated_completion {
                        println!("estimated completion: {eta}");
                    }
                }
            }
        }
        Command::Get { id } => {
            let person = people.get(PersonId(id)).await?;
            println!("{}", serde_json::to_string_pretty(&person)?);
        }
        Command::Create { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let payload: NewPerson = serde_json::from_str(&raw)?;
            let created = people.create(&payload).await?;
            println!("created person {}", created.id.0);
        }
        Command::Update { id, file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let patch: PersonPatch = serde_json::from_str(&raw)?;
            let updated = people.update(PersonId(id), &patch).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        Command::Delete { id } => {
            people.delete(PersonId(id)).await?;
            println!("deleted person {id}");
        }
        Command::DeleteNationality { nationality } => {
            let nationality: Country = nationality.parse()?;
            people.delete_by_nationality(nationality).await?;
            println!("deleted all people with nationality {nationality}");
        }
        Command::DeleteLocation { x, y, z } => {
            let selector = LocationSelector::from_parts(x, y, z)?;
            people.delete_by_location(&selector).await?;
            println!(
                "deleted one person at ({}, {}, {})",
                selector.x, selector.y, selector.z
            );
        }
        Command::CompareLocation { x, y, z } => {
            let selector = LocationSelector::from_parts(x, y, z)?;
            let result = people.located_beyond(&selector).await?;
            println!("{}", serde_json::to_string_pretty(&result.people)?);
            println!("{} matches", result.total_count);
        }
        Command::Stats => {
            let demography = DemographyClient::new(settings.demography_base_url);
            let snapshot = demography.gather(HairColor::ALL, EyeColor::ALL).await;

            println!("hair color percentages:");
            for stat in &snapshot.hair {
                match &stat.outcome {
                    Ok(percentage) => println!("  {:<12} {percentage:.2}%", stat.category),
                    Err(err) => println!("  {:<12} error: {}", stat.category, err.api_error()),
                }
            }
            println!("eye color counts:");
            for stat in &snapshot.eye {
                match &stat.outcome {
                    Ok(count) => println!("  {:<12} {count}", stat.category),
                    Err(err) => println!("  {:<12} error: {}", stat.category, err.api_error()),
                }
            }
        }
    }

    Ok(())
}

fn parse_filter(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("filter must look like name=value, got '{raw}'"))?;
    Ok((name.to_string(), value.to_string()))
}

fn parse_clause(raw: &str) -> Result<FilterClause> {
    let mut parts = raw.splitn(3, ':');
    let (Some(field), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(anyhow!("clause must look like field:op:value, got '{raw}'"));
    };
    Ok(FilterClause::new(field, parse_operator(operator)?, value))
}

fn parse_operator(raw: &str) -> Result<FilterOperator> {
    match raw.to_ascii_lowercase().as_str() {
        "eq" => Ok(FilterOperator::Eq),
        "ne" => Ok(FilterOperator::Ne),
        "gt" => Ok(FilterOperator::Gt),
        "lt" => Ok(FilterOperator::Lt),
        "gte" => Ok(FilterOperator::Gte),
        "lte" => Ok(FilterOperator::Lte),
        other => Err(anyhow!("unknown operator '{other}'")),
    }
}

fn parse_sort_order(raw: &str) -> Result<SortOrder> {
    match raw.to_ascii_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        other => Err(anyhow!("sort order must be asc or desc, got '{other}'")),
    }
}
