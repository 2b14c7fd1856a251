use std::path::Path;

use crate::models::SubmissionPayload;

/// Writes a submitted entry as CSV, one row per item with the header fields
/// repeated, ready for `COPY` into a staging table.
pub fn export_to_csv(
    payload: &SubmissionPayload,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use csv::Writer;
    use std::fs::File;

    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);
    let header = &payload.header;

    writer.write_record([
        "document_number",
        "series",
        "access_key",
        "entry_date",
        "supplier_tax_id",
        "internal_product_id",
        "supplier_sku",
        "received_quantity",
        "unit_of_measure",
        "landed_unit_cost",
    ])?;

    for item in &payload.items {
        writer.write_record(&[
            header.document_number.clone(),
            header.series.clone(),
            header.access_key.clone(),
            header.entry_date.to_string(),
            header.supplier.tax_id.clone(),
            item.internal_product_id.clone(),
            item.supplier_sku.clone(),
            item.received_quantity.to_string(),
            item.unit_of_measure.clone(),
            item.landed_unit_cost.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
