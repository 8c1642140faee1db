use std::fmt::Write;

use chrono::{DateTime, Utc};
use rental_desk::workflows::verification::{
    AssignmentList, AssignmentReceipt, DeskEvent, Document, LandlordView, NoticeLevel, Region,
    ReviewControls, ReviewReceipt, VerificationRecord,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

fn timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// One line per notice; login redirects are reported by the caller.
pub(crate) fn events(events: &[DeskEvent]) -> String {
    let mut out = String::new();
    for event in events {
        if let DeskEvent::Notice(notice) = event {
            let tag = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Error => "error",
            };
            let _ = writeln!(out, "[{tag}] {}", notice.message);
        }
    }
    out
}

pub(crate) fn regions(regions: &[Region]) -> String {
    if regions.is_empty() {
        return "No regions configured\n".to_string();
    }

    let mut out = String::from("Regions\n");
    for region in regions {
        let _ = write!(out, "  {}  {}", region.id, region.display_name());
        if let Some(url) = &region.document_url {
            let _ = write!(out, "  template: {url}");
        }
        out.push('\n');
    }
    out
}

pub(crate) fn assignments<F>(list: &AssignmentList, region_label: F) -> String
where
    F: Fn(&VerificationRecord) -> String,
{
    let mut out = format!(
        "Assignments for landlord {} in region {}\n",
        list.landlord_id, list.region_id
    );
    if list.records.is_empty() {
        out.push_str("  none\n");
        return out;
    }

    for record in &list.records {
        let tenant = record
            .tenant_name
            .as_deref()
            .unwrap_or(record.tenant_id.as_str());
        let _ = write!(
            out,
            "  {}  {:<24} {:<13} {}",
            record.id,
            tenant,
            record.status.label(),
            region_label(record)
        );
        if let Some(remark) = &record.remark {
            let _ = write!(out, "  remark: {remark}");
        }
        out.push('\n');
    }
    out
}

pub(crate) fn record<F>(
    record: &VerificationRecord,
    region_label: &str,
    controls: ReviewControls,
    document_url: F,
) -> String
where
    F: Fn(&Document) -> String,
{
    let mut out = format!("Verification {}\n", record.id);
    let tenant = match &record.tenant_name {
        Some(name) => format!("{name} ({})", record.tenant_id),
        None => record.tenant_id.to_string(),
    };
    let _ = writeln!(out, "  Tenant: {tenant}");
    let _ = writeln!(out, "  Region: {region_label}");
    let _ = writeln!(out, "  Status: {}", record.status);
    if let Some(remark) = &record.remark {
        let _ = writeln!(out, "  Remark: {remark}");
    }
    if let Some(verified_at) = &record.verified_at {
        let _ = writeln!(out, "  Reviewed: {}", timestamp(verified_at));
    }

    document_section(&mut out, "Region documents", &record.documents, &document_url);
    document_section(
        &mut out,
        "Tenant uploads",
        &record.tenant_documents,
        &document_url,
    );

    if controls.panel_visible {
        let state = if controls.approve_enabled && controls.reject_enabled {
            "open"
        } else {
            "closed"
        };
        let _ = writeln!(out, "  Review: {state}");
    }
    out
}

fn document_section<F>(out: &mut String, title: &str, documents: &[Document], document_url: &F)
where
    F: Fn(&Document) -> String,
{
    if documents.is_empty() {
        let _ = writeln!(out, "  {title}: none");
        return;
    }
    let _ = writeln!(out, "  {title}:");
    for document in documents {
        let _ = write!(
            out,
            "    - {} ({}) uploaded {}",
            document.name,
            document_url(document),
            timestamp(&document.uploaded_at)
        );
        if let Some(by) = &document.uploaded_by {
            let _ = write!(out, " by {by}");
        }
        out.push('\n');
    }
}

pub(crate) fn landlord(view: &LandlordView, region_label: Option<String>) -> String {
    let summary = &view.summary;
    let mut out = format!("Landlord {} ({})\n", summary.name, summary.id);
    if let Some(saved_at) = &view.stale_since {
        let _ = writeln!(
            out,
            "  Showing cached copy from {}; the API is unreachable",
            timestamp(saved_at)
        );
    }
    if let Some(email) = &summary.email {
        let _ = writeln!(out, "  Email: {email}");
    }
    if let Some(phone) = &summary.phone {
        let _ = writeln!(out, "  Phone: {phone}");
    }
    let _ = writeln!(
        out,
        "  Region: {}",
        region_label.unwrap_or_else(|| "not linked".to_string())
    );
    if let Some(count) = summary.tenant_count {
        let _ = writeln!(out, "  Tenants: {count}");
    }
    if let Some(id) = &summary.verification_id {
        let _ = writeln!(out, "  Verification: {id}");
    }
    out
}

pub(crate) fn assignment_receipt(receipt: &AssignmentReceipt) -> String {
    format!(
        "Assigned region {} documents for landlord {} to {} tenant(s)\n",
        receipt.region_id, receipt.landlord_id, receipt.tenant_count
    )
}

pub(crate) fn review_receipt(receipt: &ReviewReceipt) -> String {
    format!(
        "Verification {} is now {}\n",
        receipt.verification_id, receipt.status
    )
}
