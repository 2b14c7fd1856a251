#![allow(dead_code)]

use bigdecimal::BigDecimal;
use nfe_stock_entry::models::ProductMapping;
use std::str::FromStr;

pub const SUPPLIER: &str = "12345678000190";

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

/// One invoice line: (sku, unit, quantity, line value).
pub type Line<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Document level charges: freight, IPI and other expenses.
pub type Charges<'a> = (&'a str, &'a str, &'a str);

/// Minimal NF-e with the given lines and freight; the product total is the
/// sum of the line values.
pub fn nfe_xml(tax_id: &str, number: &str, lines: &[Line], freight: &str) -> String {
    nfe_xml_with_charges(tax_id, number, lines, (freight, "0", "0"))
}

pub fn nfe_xml_with_charges(
    tax_id: &str,
    number: &str,
    lines: &[Line],
    (freight, ipi, other): Charges,
) -> String {
    let mut det = String::new();
    let mut total = BigDecimal::from(0);
    for (i, (sku, unit, qty, value)) in lines.iter().enumerate() {
        let unit_price = (dec(value) / dec(qty)).with_scale(10);
        total += dec(value);
        det.push_str(&format!(
            r#"<det nItem="{n}"><prod><cProd>{sku}</cProd><xProd>Item {sku}</xProd><uCom>{unit}</uCom>
            <qCom>{qty}</qCom><vUnCom>{unit_price}</vUnCom><vProd>{value}</vProd></prod>
            <imposto><ICMS><ICMS40><orig>0</orig><CST>40</CST></ICMS40></ICMS></imposto></det>"#,
            n = i + 1,
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00"><NFe>
<infNFe Id="NFe3524{tax_id}55001{number:0>9}" versao="4.00">
<ide><serie>1</serie><nNF>{number}</nNF><dhEmi>2024-01-15T10:30:00-03:00</dhEmi></ide>
<emit><CNPJ>{tax_id}</CNPJ><xNome>Fornecedor {tax_id}</xNome></emit>
{det}
<total><ICMSTot><vProd>{total}</vProd><vFrete>{freight}</vFrete><vIPI>{ipi}</vIPI><vOutro>{other}</vOutro>
<vNF>{total}</vNF></ICMSTot></total>
</infNFe></NFe></nfeProc>"#
    )
}

pub fn mapping(tax_id: &str, sku: &str, product: &str, unit: &str) -> ProductMapping {
    ProductMapping {
        supplier_tax_id: tax_id.to_string(),
        supplier_sku: sku.to_string(),
        internal_product_id: product.to_string(),
        description: format!("Produto {product}"),
        category: Some("HIDRAULICA".to_string()),
        unit_of_measure: Some(unit.to_string()),
    }
}
