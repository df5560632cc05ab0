use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use estate_core::{
    PerPage, PropertyFields, PropertyId, PropertyStatus, PropertyType, QueryAction, SortBy,
    SortOrder,
};

use crate::console::FieldChanges;

#[derive(Parser, Debug)]
#[command(name = "estate-admin")]
#[command(about = "Admin console for the property listing backend")]
#[command(version)]
pub struct Cli {
    /// Settings file (YAML); defaults to ./estate-admin.yaml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, e.g. http://127.0.0.1:8000/api
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Static storage URL for images
    #[arg(long, global = true)]
    pub asset_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session token
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account and log in with it
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Forget the stored session token
    Logout,

    /// Print one page of properties
    List(ListArgs),

    /// Interactive listing with filters, paging and delete
    Browse,

    /// Show one property with its images
    Show { id: PropertyId },

    /// Create a property
    Create {
        #[command(flatten)]
        fields: CreateArgs,

        /// Image file to upload (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },

    /// Edit a property; unspecified fields keep their current values
    Edit {
        id: PropertyId,

        #[command(flatten)]
        changes: EditArgs,

        /// Image file to add (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,

        /// Gallery position to remove, as listed by `show` (repeatable)
        #[arg(long = "remove-image")]
        remove: Vec<usize>,
    },

    /// Delete a property
    Delete {
        id: PropertyId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Title contains
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long = "type")]
    pub property_type: Option<PropertyType>,
    #[arg(long)]
    pub status: Option<PropertyStatus>,
    #[arg(long)]
    pub sort: Option<SortBy>,
    #[arg(long)]
    pub order: Option<SortOrder>,
    #[arg(long)]
    pub per_page: Option<PerPage>,
    #[arg(long)]
    pub page: Option<u32>,
}

impl ListArgs {
    /// Actions in an order where the requested page survives the filters.
    pub fn actions(self) -> Vec<QueryAction> {
        let mut actions = Vec::new();
        if let Some(search) = self.search {
            actions.push(QueryAction::SetSearch(search));
        }
        if let Some(city) = self.city {
            actions.push(QueryAction::SetCity(city));
        }
        if self.property_type.is_some() {
            actions.push(QueryAction::SetPropertyType(self.property_type));
        }
        if self.status.is_some() {
            actions.push(QueryAction::SetStatus(self.status));
        }
        if let Some(per_page) = self.per_page {
            actions.push(QueryAction::SetPerPage(per_page));
        }
        if let Some(sort) = self.sort {
            actions.push(QueryAction::SetSortBy(sort));
        }
        if let Some(order) = self.order {
            actions.push(QueryAction::SetOrder(order));
        }
        if let Some(page) = self.page {
            actions.push(QueryAction::SetPage(page));
        }
        actions
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long = "type")]
    pub property_type: PropertyType,
    #[arg(long, default_value = "available")]
    pub status: PropertyStatus,
    #[arg(long)]
    pub price: String,
    #[arg(long)]
    pub area: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub district: String,
    #[arg(long)]
    pub contact_name: String,
    #[arg(long)]
    pub contact_phone: String,
}

impl From<CreateArgs> for PropertyFields {
    fn from(args: CreateArgs) -> Self {
        PropertyFields {
            title: args.title,
            property_type: Some(args.property_type),
            status: args.status,
            price: args.price,
            area: args.area,
            address: args.address,
            city: args.city,
            district: args.district,
            contact_name: args.contact_name,
            contact_phone: args.contact_phone,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long = "type")]
    pub property_type: Option<PropertyType>,
    #[arg(long)]
    pub status: Option<PropertyStatus>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub area: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub district: Option<String>,
    #[arg(long)]
    pub contact_name: Option<String>,
    #[arg(long)]
    pub contact_phone: Option<String>,
}

impl From<EditArgs> for FieldChanges {
    fn from(args: EditArgs) -> Self {
        FieldChanges {
            title: args.title,
            property_type: args.property_type,
            status: args.status,
            price: args.price,
            area: args.area,
            address: args.address,
            city: args.city,
            district: args.district,
            contact_name: args.contact_name,
            contact_phone: args.contact_phone,
        }
    }
}
