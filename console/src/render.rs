use std::io::{self, Write};

use estate_core::{
    AssetUrls, FieldErrors, ListingController, Preview, Property, PropertyDetail, PropertyForm,
};

/// Listing table with the pager line below it.
pub fn listing(out: &mut impl Write, listing: &ListingController) -> io::Result<()> {
    if let Some(error) = listing.error() {
        writeln!(out, "error: {error}")?;
    }
    let Some(page) = listing.page() else {
        return writeln!(out, "(no data loaded)");
    };

    if page.data.is_empty() {
        writeln!(out, "No properties match the current filters.")?;
    } else {
        writeln!(
            out,
            "{:>5}  {:<28} {:<10} {:<10} {:>16} {:>8}  {}",
            "id", "title", "type", "status", "price", "area", "city"
        )?;
        for property in &page.data {
            row(out, property)?;
        }
    }

    let mut pager = format!(
        "page {} of {} ({} total, {} per page)",
        page.current_page, page.last_page, page.total, page.per_page
    );
    if listing.can_go_prev() {
        pager.push_str("  [prev]");
    }
    if listing.can_go_next() {
        pager.push_str("  [next]");
    }
    writeln!(out, "{pager}")
}

fn row(out: &mut impl Write, p: &Property) -> io::Result<()> {
    writeln!(
        out,
        "{:>5}  {:<28} {:<10} {:<10} {:>16} {:>8}  {}",
        p.id.0,
        truncate(&p.title, 28),
        p.property_type.as_str(),
        p.status.as_str(),
        format!("{:.0}", p.price),
        format!("{:.1}", p.area),
        p.city
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn detail(out: &mut impl Write, detail: &PropertyDetail, assets: &AssetUrls) -> io::Result<()> {
    let p = &detail.property;
    writeln!(out, "#{} {}", p.id, p.title)?;
    writeln!(out, "  type:     {}", p.property_type)?;
    writeln!(out, "  status:   {}", p.status)?;
    writeln!(out, "  price:    {:.0}", p.price)?;
    writeln!(out, "  area:     {:.1}", p.area)?;
    writeln!(out, "  rooms:    {} bed / {} bath / {} floors", p.bedrooms, p.bathrooms, p.floors)?;
    writeln!(out, "  address:  {}, {}, {}", p.address, p.district, p.city)?;
    writeln!(out, "  contact:  {} ({})", p.contact_name, p.contact_phone)?;
    if let Some(description) = p.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out, "  {description}")?;
    }
    if detail.images.is_empty() {
        return writeln!(out, "  no images");
    }
    writeln!(out, "  images:")?;
    for image in &detail.images {
        let url = assets.image_url(image).unwrap_or_else(|| "(no stored file)".to_string());
        let primary = if image.is_primary { " *" } else { "" };
        writeln!(out, "    [{}] {}{primary} {url}", image.id, image.image_name)?;
    }
    Ok(())
}

/// Gallery tiles in removal-index order.
pub fn previews(out: &mut impl Write, form: &PropertyForm, assets: &AssetUrls) -> io::Result<()> {
    for (index, preview) in form.previews(assets).iter().enumerate() {
        match preview {
            Preview::Persisted { image_id, url } => writeln!(
                out,
                "  {index}: image {image_id} {}",
                url.as_deref().unwrap_or("(no stored file)")
            )?,
            Preview::Local { file_name } => writeln!(out, "  {index}: new file {file_name}")?,
        }
    }
    Ok(())
}

pub fn field_errors(out: &mut impl Write, errors: &FieldErrors) -> io::Result<()> {
    for (field, message) in errors {
        writeln!(out, "  {field}: {message}")?;
    }
    Ok(())
}
