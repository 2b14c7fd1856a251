//! NFe XML -> [`InvoiceDocument`].
//!
//! Lookups are done by local name in the NFe namespace and fall back to a
//! namespace-agnostic search, so documents without the `xmlns` declaration
//! (common in exports from older emitters) parse the same way.

pub mod xml;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate};
use std::collections::HashSet;
use std::str::FromStr;

use crate::error::ParseError;
use crate::models::{DocumentTotals, InvoiceDocument, InvoiceLineItem, SupplierIdentity, TaxDetail};
use xml::Element;

pub const NFE_NAMESPACE: &str = "http://www.portalfiscal.inf.br/nfe";

/// Literal prefix of the `infNFe/@Id` attribute.
const ACCESS_KEY_PREFIX: &str = "NFe";

/// Widest numeric field of the layout (`vUnCom`, 11v10).
const MAX_INTEGER_DIGITS: usize = 15;
const MAX_FRACTION_DIGITS: usize = 10;

/// Parses a full NFe (or `nfeProc`) document.
pub fn parse_document(raw: &str) -> Result<InvoiceDocument, ParseError> {
    let root = xml::parse_tree(raw)?;
    let inf = root
        .find(NFE_NAMESPACE, "infNFe")
        .ok_or(ParseError::MissingIdentification)?;

    let access_key = inf
        .attribute("Id")
        .map(|id| id.strip_prefix(ACCESS_KEY_PREFIX).unwrap_or(id).to_string())
        .unwrap_or_default();

    let ide = inf.find(NFE_NAMESPACE, "ide");
    let number = ide.and_then(|e| text(e, "nNF")).unwrap_or_default().to_string();
    let series = ide.and_then(|e| text(e, "serie")).unwrap_or_default().to_string();
    let issue_date = ide.and_then(parse_issue_date);

    let supplier = parse_supplier(inf.find(NFE_NAMESPACE, "emit"));
    let totals = parse_totals(inf.find(NFE_NAMESPACE, "ICMSTot"))?;

    let items = inf
        .find_all(NFE_NAMESPACE, "det")
        .into_iter()
        .enumerate()
        .map(|(idx, det)| parse_line_item(idx, det))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::with_capacity(items.len());
    if let Some(dup) = items.iter().find(|i| !seen.insert(i.sequence)) {
        return Err(ParseError::DuplicateItem(dup.sequence));
    }

    tracing::debug!(
        access_key = %access_key,
        number = %number,
        items = items.len(),
        "parsed NFe document"
    );

    Ok(InvoiceDocument {
        access_key,
        number,
        series,
        issue_date,
        supplier,
        totals,
        items,
    })
}

fn text<'a>(parent: &'a Element, name: &str) -> Option<&'a str> {
    parent.child_text(NFE_NAMESPACE, name)
}

/// Numeric child value; absent or empty leaves read as zero.
fn decimal(parent: Option<&Element>, name: &str) -> Result<BigDecimal, ParseError> {
    match parent.and_then(|p| text(p, name)) {
        None => Ok(BigDecimal::zero()),
        Some(raw) => number(name, raw),
    }
}

/// Plain `[-]digits[.digits]` within the layout's widths. Exponent notation
/// is refused.
fn number(tag: &str, raw: &str) -> Result<BigDecimal, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        tag: tag.to_string(),
        value: raw.to_string(),
    };
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let plain = |digits: &str, max: usize| {
        digits.len() <= max && digits.bytes().all(|b| b.is_ascii_digit())
    };
    if int.is_empty() || !plain(int, MAX_INTEGER_DIGITS) || !plain(frac, MAX_FRACTION_DIGITS) {
        return Err(invalid());
    }
    BigDecimal::from_str(raw).map_err(|_| invalid())
}

fn parse_issue_date(ide: &Element) -> Option<NaiveDate> {
    if let Some(raw) = text(ide, "dhEmi") {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        // some emitters send dhEmi without offset
        if let Some(date) = raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
            return Some(date);
        }
    }
    text(ide, "dEmi").and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

fn parse_supplier(emit: Option<&Element>) -> SupplierIdentity {
    let Some(emit) = emit else {
        return SupplierIdentity {
            tax_id: String::new(),
            legal_name: String::new(),
            trade_name: None,
        };
    };
    SupplierIdentity {
        tax_id: text(emit, "CNPJ")
            .or_else(|| text(emit, "CPF"))
            .unwrap_or_default()
            .to_string(),
        legal_name: text(emit, "xNome").unwrap_or_default().to_string(),
        trade_name: text(emit, "xFant").map(str::to_string),
    }
}

fn parse_totals(tot: Option<&Element>) -> Result<DocumentTotals, ParseError> {
    Ok(DocumentTotals {
        product_total: decimal(tot, "vProd")?,
        freight_total: decimal(tot, "vFrete")?,
        ipi_total: decimal(tot, "vIPI")?,
        other_expenses_total: decimal(tot, "vOutro")?,
        discount_total: decimal(tot, "vDesc")?,
        icms_total: decimal(tot, "vICMS")?,
        icms_st_total: decimal(tot, "vST")?,
        approx_tax_total: decimal(tot, "vTotTrib")?,
        grand_total: decimal(tot, "vNF")?,
    })
}

fn parse_line_item(idx: usize, det: &Element) -> Result<InvoiceLineItem, ParseError> {
    let sequence = det
        .attribute("nItem")
        .and_then(|n| n.trim().parse::<u32>().ok())
        .unwrap_or(idx as u32 + 1);

    let prod = det.child(NFE_NAMESPACE, "prod");
    let imposto = det.child(NFE_NAMESPACE, "imposto");

    let field = |name: &str| {
        prod.and_then(|p| text(p, name))
            .unwrap_or_default()
            .to_string()
    };

    Ok(InvoiceLineItem {
        sequence,
        supplier_sku: field("cProd"),
        description: field("xProd"),
        unit_of_measure: field("uCom"),
        invoiced_quantity: decimal(prod, "qCom")?,
        unit_price: decimal(prod, "vUnCom")?,
        line_product_value: decimal(prod, "vProd")?,
        icms: tax_detail(imposto.and_then(|i| i.child(NFE_NAMESPACE, "ICMS")), "vICMS")?,
        ipi: tax_detail(imposto.and_then(|i| i.child(NFE_NAMESPACE, "IPI")), "vIPI")?,
    })
}

/// Scans the regime children of a tax group (`ICMS00`, `ICMSSN102`,
/// `IPITrib`, ...) and takes the first one carrying `value_leaf`.
fn tax_detail(group: Option<&Element>, value_leaf: &str) -> Result<TaxDetail, ParseError> {
    let Some(group) = group else {
        return Ok(TaxDetail::Absent);
    };

    for regime in group.children.iter().filter(|c| !c.children.is_empty()) {
        if let Some(raw) = text(regime, value_leaf) {
            let value = number(value_leaf, raw)?;
            return Ok(TaxDetail::Taxed {
                regime: regime.name.clone(),
                value,
            });
        }
    }

    Ok(group
        .children
        .iter()
        .find(|c| !c.children.is_empty())
        .map(|regime| TaxDetail::Untaxed {
            regime: regime.name.clone(),
        })
        .unwrap_or(TaxDetail::Absent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe>
    <infNFe Id="NFe35240112345678000190550010000012341000012345" versao="4.00">
      <ide>
        <serie>1</serie>
        <nNF>1234</nNF>
        <dhEmi>2024-01-15T10:30:00-03:00</dhEmi>
      </ide>
      <emit>
        <CNPJ>12345678000190</CNPJ>
        <xNome>Distribuidora Hidraulica Ltda</xNome>
        <xFant>Hidro Dist</xFant>
      </emit>
      <det nItem="1">
        <prod>
          <cProd>TUB-50</cProd>
          <xProd>Tubo PVC 50mm</xProd>
          <uCom>M</uCom>
          <qCom>12.0000</qCom>
          <vUnCom>5.0000</vUnCom>
          <vProd>60.00</vProd>
        </prod>
        <imposto>
          <ICMS><ICMS00><orig>0</orig><CST>00</CST><vBC>60.00</vBC><pICMS>18.00</pICMS><vICMS>10.80</vICMS></ICMS00></ICMS>
          <IPI><cEnq>999</cEnq><IPITrib><CST>50</CST><vBC>60.00</vBC><pIPI>5.00</pIPI><vIPI>3.00</vIPI></IPITrib></IPI>
        </imposto>
      </det>
      <det nItem="2">
        <prod>
          <cProd>BOMBA-1</cProd>
          <xProd>Bomba submersa</xProd>
          <uCom>UN</uCom>
          <qCom>1.0000</qCom>
          <vUnCom>40.00</vUnCom>
          <vProd>40.00</vProd>
        </prod>
        <imposto>
          <ICMS><ICMS40><orig>0</orig><CST>40</CST></ICMS40></ICMS>
          <IPI><cEnq>999</cEnq><IPINT><CST>53</CST></IPINT></IPI>
        </imposto>
      </det>
      <total>
        <ICMSTot>
          <vBC>60.00</vBC><vICMS>10.80</vICMS><vST>0.00</vST><vProd>100.00</vProd>
          <vFrete>10.00</vFrete><vDesc>0.00</vDesc><vIPI>3.00</vIPI><vOutro>2.00</vOutro>
          <vNF>115.00</vNF><vTotTrib>12.50</vTotTrib>
        </ICMSTot>
      </total>
    </infNFe>
  </NFe>
</nfeProc>"#;

    #[test]
    fn parses_header_supplier_and_totals() {
        let doc = parse_document(SAMPLE).unwrap();

        assert_eq!(doc.access_key, "35240112345678000190550010000012341000012345");
        assert_eq!(doc.number, "1234");
        assert_eq!(doc.series, "1");
        assert_eq!(doc.issue_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(doc.supplier.tax_id, "12345678000190");
        assert_eq!(doc.supplier.legal_name, "Distribuidora Hidraulica Ltda");
        assert_eq!(doc.supplier.trade_name.as_deref(), Some("Hidro Dist"));

        assert_eq!(doc.totals.product_total, dec("100.00"));
        assert_eq!(doc.totals.freight_total, dec("10.00"));
        assert_eq!(doc.totals.ipi_total, dec("3.00"));
        assert_eq!(doc.totals.other_expenses_total, dec("2.00"));
        assert_eq!(doc.totals.grand_total, dec("115.00"));
        assert_eq!(doc.totals.approx_tax_total, dec("12.50"));
    }

    #[test]
    fn parses_line_items_with_regime_dependent_taxes() {
        let doc = parse_document(SAMPLE).unwrap();
        assert_eq!(doc.items.len(), 2);

        let tube = &doc.items[0];
        assert_eq!(tube.sequence, 1);
        assert_eq!(tube.supplier_sku, "TUB-50");
        assert_eq!(tube.unit_of_measure, "M");
        assert_eq!(tube.invoiced_quantity, dec("12"));
        assert_eq!(tube.line_product_value, dec("60"));
        assert_eq!(tube.line_icms(), dec("10.80"));
        assert_eq!(tube.icms.regime(), Some("ICMS00"));
        assert_eq!(tube.line_ipi(), dec("3.00"));
        assert_eq!(tube.ipi.regime(), Some("IPITrib"));

        let pump = &doc.items[1];
        assert_eq!(pump.sequence, 2);
        assert!(pump.line_icms().is_zero());
        assert_eq!(pump.icms, TaxDetail::Untaxed { regime: "ICMS40".into() });
        assert_eq!(pump.ipi, TaxDetail::Untaxed { regime: "IPINT".into() });
    }

    #[test]
    fn parses_documents_without_namespace() {
        let xml = r#"<NFe><infNFe Id="NFe999"><ide><nNF>7</nNF><dEmi>2023-05-02</dEmi></ide>
            <emit><CPF>12345678901</CPF><xNome>Joao</xNome></emit>
            <det nItem="1"><prod><cProd>A</cProd><uCom>KG</uCom><qCom>1.5</qCom><vProd>3</vProd></prod></det>
            </infNFe></NFe>"#;
        let doc = parse_document(xml).unwrap();

        assert_eq!(doc.access_key, "999");
        assert_eq!(doc.issue_date, NaiveDate::from_ymd_opt(2023, 5, 2));
        assert_eq!(doc.supplier.tax_id, "12345678901");
        assert_eq!(doc.supplier.trade_name, None);
        assert_eq!(doc.items[0].icms, TaxDetail::Absent);
        assert!(doc.items[0].unit_price.is_zero());
    }

    #[test]
    fn missing_numerics_default_to_zero() {
        let xml = r#"<infNFe Id="NFe1"><det><prod><cProd>X</cProd></prod></det><total><ICMSTot/></total></infNFe>"#;
        let doc = parse_document(xml).unwrap();

        assert!(doc.totals.freight_total.is_zero());
        assert!(doc.totals.grand_total.is_zero());
        assert_eq!(doc.items[0].sequence, 1);
        assert!(doc.items[0].invoiced_quantity.is_zero());
        assert!(doc.items[0].line_product_value.is_zero());
    }

    #[test]
    fn missing_identification_block_is_a_parse_error() {
        let err = parse_document("<nfeProc><NFe/></nfeProc>").unwrap_err();
        assert!(matches!(err, ParseError::MissingIdentification));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = parse_document("<nfeProc><infNFe Id=\"NFe1\"></nfeProc>").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn garbage_numbers_name_the_tag() {
        let xml = r#"<infNFe Id="NFe1"><total><ICMSTot><vFrete>abc</vFrete></ICMSTot></total></infNFe>"#;
        match parse_document(xml) {
            Err(ParseError::InvalidNumber { tag, value }) => {
                assert_eq!(tag, "vFrete");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn repeated_item_number_is_rejected() {
        // the first det falls back to its position, which collides with nItem="1"
        let xml = r#"<infNFe Id="NFe1">
            <det><prod><cProd>A</cProd><vProd>60</vProd></prod></det>
            <det nItem="1"><prod><cProd>B</cProd><vProd>40</vProd></prod></det>
            <total><ICMSTot><vFrete>10</vFrete></ICMSTot></total></infNFe>"#;

        let err = parse_document(xml).unwrap_err();

        assert!(matches!(err, ParseError::DuplicateItem(1)));
    }

    #[test]
    fn exponent_and_oversized_numbers_are_rejected() {
        for raw in ["1e-200000000", "1E5", "0.12345678901", "1234567890123456", ".5", "-", "+1"] {
            let xml = format!(
                r#"<infNFe Id="NFe1"><det nItem="1"><prod><cProd>A</cProd><qCom>{raw}</qCom></prod></det></infNFe>"#
            );
            match parse_document(&xml) {
                Err(ParseError::InvalidNumber { tag, value }) => {
                    assert_eq!(tag, "qCom");
                    assert_eq!(value, raw);
                }
                other => panic!("{raw}: unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn layout_width_numbers_are_accepted() {
        let xml = r#"<infNFe Id="NFe1"><det nItem="1"><prod><cProd>A</cProd>
            <qCom>-3.5</qCom><vUnCom>12345678901.1234567890</vUnCom></prod></det></infNFe>"#;
        let doc = parse_document(xml).unwrap();

        assert_eq!(doc.items[0].invoiced_quantity, dec("-3.5"));
        assert_eq!(doc.items[0].unit_price, dec("12345678901.1234567890"));
    }
}
