//! Postgres-backed collaborators.

use async_trait::async_trait;
use sqlx::PgPool;
use std::time::{Duration, Instant};

use crate::error::StoreError;
use crate::models::{
    MappingAssignment, NewSupplier, ProductMapping, SubmissionPayload, SubmissionReceipt,
    Supplier, SupplierCheck,
};
use crate::service::ports::{MappingStore, StockSubmission, SupplierDirectory};

/// Bound for the whole entry transaction.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Mapping store, supplier directory and stock submission over one pool.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MappingStore for PgCatalog {
    async fn lookup_mappings(
        &self,
        supplier_tax_id: &str,
        skus: &[String],
    ) -> Result<Vec<ProductMapping>, StoreError> {
        let rows = sqlx::query_as::<_, ProductMapping>(
            r#"
            SELECT m.supplier_tax_id,
                   m.supplier_sku,
                   m.internal_product_id,
                   p.description,
                   p.category,
                   p.unit_of_measure
            FROM supplier_product_mapping m
            INNER JOIN product p ON p.id = m.internal_product_id
            WHERE m.supplier_tax_id = $1
              AND m.supplier_sku = ANY($2)
            "#,
        )
        .bind(supplier_tax_id)
        .bind(skus)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn assign_mapping(
        &self,
        supplier_tax_id: &str,
        supplier_sku: &str,
        assignment: &MappingAssignment,
    ) -> Result<ProductMapping, StoreError> {
        let mapping = sqlx::query_as::<_, ProductMapping>(
            r#"
            WITH upserted AS (
                INSERT INTO supplier_product_mapping (supplier_tax_id, supplier_sku, internal_product_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (supplier_tax_id, supplier_sku)
                DO UPDATE SET internal_product_id = EXCLUDED.internal_product_id
                RETURNING supplier_tax_id, supplier_sku, internal_product_id
            )
            SELECT u.supplier_tax_id,
                   u.supplier_sku,
                   u.internal_product_id,
                   p.description,
                   p.category,
                   p.unit_of_measure
            FROM upserted u
            INNER JOIN product p ON p.id = u.internal_product_id
            "#,
        )
        .bind(supplier_tax_id)
        .bind(supplier_sku)
        .bind(&assignment.internal_product_id)
        .fetch_optional(&self.pool)
        .await?;

        mapping.ok_or_else(|| {
            StoreError::Rejected(format!(
                "unknown internal product {}",
                assignment.internal_product_id
            ))
        })
    }
}

#[async_trait]
impl SupplierDirectory for PgCatalog {
    async fn check_supplier_exists(&self, tax_id: &str) -> Result<SupplierCheck, StoreError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, tax_id, legal_name, trade_name
            FROM supplier
            WHERE tax_id = $1
            "#,
        )
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(SupplierCheck {
            exists: supplier.is_some(),
            supplier,
        })
    }

    async fn create_supplier(&self, supplier: &NewSupplier) -> Result<Supplier, StoreError> {
        let created = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO supplier (tax_id, legal_name, trade_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (tax_id) DO NOTHING
            RETURNING id, tax_id, legal_name, trade_name
            "#,
        )
        .bind(&supplier.tax_id)
        .bind(&supplier.legal_name)
        .bind(&supplier.trade_name)
        .fetch_optional(&self.pool)
        .await?;

        created.ok_or_else(|| {
            StoreError::Rejected(format!("supplier {} already registered", supplier.tax_id))
        })
    }
}

#[async_trait]
impl StockSubmission for PgCatalog {
    async fn submit_entry(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, StoreError> {
        let started = Instant::now();
        match tokio::time::timeout(SUBMIT_TIMEOUT, insert_entry(&self.pool, payload)).await {
            Ok(Ok(receipt)) => {
                tracing::info!(
                    "Stock entry {} stored, {} items, took {:?}",
                    receipt.entry_id,
                    receipt.items_processed,
                    started.elapsed()
                );
                Ok(receipt)
            }
            Ok(Err(e)) => {
                tracing::error!("Stock entry insert failed after {:?}: {:?}", started.elapsed(), e);
                Err(e)
            }
            Err(_) => {
                tracing::error!("Stock entry insert timed out (>{:?})", SUBMIT_TIMEOUT);
                Err(StoreError::Timeout)
            }
        }
    }
}

async fn insert_entry(
    pool: &PgPool,
    payload: &SubmissionPayload,
) -> Result<SubmissionReceipt, StoreError> {
    let header = &payload.header;
    let mut tx = pool.begin().await?;

    let duplicate: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM stock_entry WHERE access_key = $1 AND access_key <> ''",
    )
    .bind(&header.access_key)
    .fetch_optional(&mut *tx)
    .await?;
    if let Some(existing) = duplicate {
        return Err(StoreError::Rejected(format!(
            "invoice {} already entered as stock entry {}",
            header.access_key, existing
        )));
    }

    let entry_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO stock_entry (
            document_number, series, access_key, entry_date, issue_date,
            supplier_tax_id, supplier_name,
            product_total, freight_total, ipi_total, other_expenses_total,
            discount_total, grand_total
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(&header.document_number)
    .bind(&header.series)
    .bind(&header.access_key)
    .bind(header.entry_date)
    .bind(header.issue_date)
    .bind(&header.supplier.tax_id)
    .bind(&header.supplier.legal_name)
    .bind(header.totals.product_total.clone())
    .bind(header.totals.freight_total.clone())
    .bind(header.totals.ipi_total.clone())
    .bind(header.totals.other_expenses_total.clone())
    .bind(header.totals.discount_total.clone())
    .bind(header.totals.grand_total.clone())
    .fetch_one(&mut *tx)
    .await?;

    if !payload.items.is_empty() {
        let mut query_builder = sqlx::QueryBuilder::new(
            "INSERT INTO stock_entry_item (
                entry_id, internal_product_id, supplier_sku,
                received_quantity, unit_of_measure, landed_unit_cost
            ) ",
        );
        query_builder.push_values(&payload.items, |mut b, item| {
            b.push_bind(entry_id)
                .push_bind(&item.internal_product_id)
                .push_bind(&item.supplier_sku)
                .push_bind(item.received_quantity.clone())
                .push_bind(&item.unit_of_measure)
                .push_bind(item.landed_unit_cost.clone());
        });
        query_builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    Ok(SubmissionReceipt {
        entry_id,
        items_processed: payload.items.len(),
    })
}
