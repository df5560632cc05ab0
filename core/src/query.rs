//! Filter, sort and pagination state for the property listing.
//!
//! `QueryState` is a plain value; every user interaction is a [`QueryAction`]
//! applied by the pure reducer [`QueryState::apply`]. Reset rules:
//!
//! - changing `search`, `city`, `property_type` or `status` resets `page` to 1;
//! - changing `per_page` resets `page` to 1;
//! - changing `sort_by` or `order` keeps every other field.
//!
//! Page navigation is clamped to `1..=last_page` once the server has reported
//! `last_page`; before that only the lower bound applies.

use crate::types::{PerPage, PropertyStatus, PropertyType, SortBy, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub search: String,
    pub city: String,
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,
    pub sort_by: SortBy,
    pub order: SortOrder,
    pub page: u32,
    pub per_page: PerPage,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search: String::new(),
            city: String::new(),
            property_type: None,
            status: None,
            sort_by: SortBy::CreatedAt,
            order: SortOrder::Desc,
            page: 1,
            per_page: PerPage::Ten,
        }
    }
}

/// A single field update coming from a listing control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAction {
    SetSearch(String),
    SetCity(String),
    SetPropertyType(Option<PropertyType>),
    SetStatus(Option<PropertyStatus>),
    SetSortBy(SortBy),
    SetOrder(SortOrder),
    SetPerPage(PerPage),
    SetPage(u32),
    NextPage,
    PrevPage,
}

impl QueryState {
    /// Produce the next state. `last_page` is the bound reported by the most
    /// recent successful response, if any.
    pub fn apply(&self, action: QueryAction, last_page: Option<u32>) -> QueryState {
        let mut next = self.clone();
        match action {
            QueryAction::SetSearch(search) => {
                next.search = search;
                next.page = 1;
            }
            QueryAction::SetCity(city) => {
                next.city = city;
                next.page = 1;
            }
            QueryAction::SetPropertyType(property_type) => {
                next.property_type = property_type;
                next.page = 1;
            }
            QueryAction::SetStatus(status) => {
                next.status = status;
                next.page = 1;
            }
            QueryAction::SetSortBy(sort_by) => next.sort_by = sort_by,
            QueryAction::SetOrder(order) => next.order = order,
            QueryAction::SetPerPage(per_page) => {
                next.per_page = per_page;
                next.page = 1;
            }
            QueryAction::SetPage(page) => next.page = clamp_page(page, last_page),
            QueryAction::NextPage => next.page = clamp_page(self.page.saturating_add(1), last_page),
            QueryAction::PrevPage => next.page = clamp_page(self.page.saturating_sub(1), last_page),
        }
        next
    }

    pub fn can_go_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_go_next(&self, last_page: u32) -> bool {
        self.page < last_page
    }

    /// Request parameters in a stable order. Empty text filters and unset enum
    /// filters are left out entirely so the server never sees `city=`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(8);
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        if !self.city.is_empty() {
            params.push(("city".to_string(), self.city.clone()));
        }
        if let Some(property_type) = self.property_type {
            params.push(("property_type".to_string(), property_type.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status".to_string(), status.to_string()));
        }
        params.push(("sort_by".to_string(), self.sort_by.to_string()));
        params.push(("order".to_string(), self.order.to_string()));
        params.push(("page".to_string(), self.page.to_string()));
        params.push(("per_page".to_string(), self.per_page.to_string()));
        params
    }
}

fn clamp_page(page: u32, last_page: Option<u32>) -> u32 {
    let upper = last_page.map(|l| l.max(1)).unwrap_or(u32::MAX);
    page.clamp(1, upper)
}
