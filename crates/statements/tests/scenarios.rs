//! End-to-end statement parsing through the registry.

use commrecon_statements::{Carrier, CarrierRegistry, CarrierSettings, DropReason};

/// Flattened columnar statement: one header per column, values underneath.
fn columnar(names: &[&str], first_segment: &[&str], rest: &[[&str; 3]], commissions: &[&str]) -> String {
    let mut lines = vec!["REF".to_string()];
    lines.extend((0..names.len()).map(|i| format!("R{}", 100 + i)));
    lines.push("FECHA".into());
    lines.extend(names.iter().map(|_| "AD".to_string()));
    lines.push("TIPO".into());
    lines.extend(first_segment.iter().map(|s| s.to_string()));
    lines.push("Póliza".into());
    for column in 0..3 {
        lines.extend(rest.iter().map(|r| r[column].to_string()));
    }
    lines.extend(names.iter().map(|s| s.to_string()));
    lines.push("Asegurado".into());
    lines.push("Prima".into());
    lines.push("%Comisión".into());
    lines.extend(commissions.iter().map(|s| s.to_string()));
    lines.push("Ganados".into());
    lines.extend(commissions.iter().map(|s| s.to_string()));
    lines.join("\n")
}

#[test]
fn two_row_statement_zips_policy_numbers() {
    let text = columnar(
        &["JUAN CARLOS PEREZ", "MARIA LOPEZ"],
        &["2", "8"],
        &[["14", "123", "5"], ["1", "98765", "0"]],
        &["12.50", ".75"],
    );
    let out = CarrierRegistry::default().parse(Carrier::Optima, &text);

    assert_eq!(out.rows.len(), 2);
    assert_eq!(out.rows[0].policy_number, "02-14-000123-5");
    assert_eq!(out.rows[0].client_name, "JUAN CARLOS PEREZ");
    assert_eq!(out.rows[0].gross_cents, 1250);
    assert_eq!(out.rows[1].policy_number, "08-01-098765-0");
    assert_eq!(out.rows[1].client_name, "MARIA LOPEZ");
    assert_eq!(out.rows[1].gross_cents, 75);
    assert_eq!(out.stats.emitted, 2);
    assert!(!out.needs_review());
}

#[test]
fn month_annotation_costs_exactly_one_row() {
    let first = ["2", "2", "2"];
    let rest = [["14", "1", "1"], ["14", "2", "2"], ["14", "3", "3"]];
    let commissions = ["10.00", "20.00", "30.00"];

    let clean = columnar(&["ANA RUIZ", "JOSE DIAZ", "LUIS MORA"], &first, &rest, &commissions);
    let annotated = columnar(&["ANA RUIZ", "NOVIEMBRE", "LUIS MORA"], &first, &rest, &commissions);

    let registry = CarrierRegistry::default();
    let baseline = registry.parse(Carrier::Mb, &clean);
    let out = registry.parse(Carrier::Mb, &annotated);

    assert_eq!(baseline.rows.len(), 3);
    assert_eq!(out.rows.len(), baseline.rows.len() - 1);
    assert!(out.rows.iter().all(|r| r.client_name != "NOVIEMBRE"));
}

#[test]
fn report_annotations_never_become_client_names() {
    let text = columnar(
        &["PAGO DE HONORARIOS", "01 AL 15 DE NOVIEMBRE", "DICIEMBRE", "ROSA GIL"],
        &["2", "2", "2", "2"],
        &[["14", "1", "1"], ["14", "2", "2"], ["14", "3", "3"], ["14", "4", "4"]],
        &["1.00", "2.00", "3.00", "4.00"],
    );
    let out = CarrierRegistry::default().parse(Carrier::Aliado, &text);
    assert_eq!(out.rows.len(), 1);
    assert_eq!(out.rows[0].client_name, "ROSA GIL");
}

#[test]
fn anchorless_text_is_flagged_for_review() {
    let out = CarrierRegistry::default().parse(Carrier::Optima, "ESTADO DE CUENTA\nsin datos\n");
    assert!(out.rows.is_empty());
    assert!(out.needs_review());
    assert_eq!(out.stats.missing_anchors, vec!["POLIZA", "ASEGURADO", "%COMISION", "GANADOS"]);
}

#[test]
fn excluded_kinds_come_from_settings() {
    let settings: CarrierSettings = toml::from_str(
        r#"
        [optima]
        excluded_kinds = ["AD"]
        "#,
    )
    .unwrap();
    let text = columnar(&["ANA RUIZ"], &["2"], &[["14", "1", "1"]], &["5.00"]);
    let out = CarrierRegistry::new(&settings).parse(Carrier::Optima, &text);
    assert!(out.rows.is_empty());
    assert_eq!(out.stats.dropped[&DropReason::ExcludedKind], 1);
}

#[test]
fn section_reports_dispatch_by_name() {
    let registry = CarrierRegistry::default();

    let vumi = "RENOVACIONES\nNúmero de Póliza\n1000000042 LUIS ALBERTO MENA\n$80.00 $8.00\nTOTAL $8.00\n";
    let out = registry.parse("vumi".parse().unwrap(), vumi);
    assert_eq!(out.rows.len(), 1);
    assert_eq!(out.rows[0].client_name, "LUIS ALBERTO MENA");
    assert_eq!(out.rows[0].gross_cents, 800);

    let palig = "PÓLIZA / CERT\n20.00 10.00 0.00 2.00LUIS MENA 2.0077001 / 1\nTOTAL 2.00\n";
    let out = registry.parse(Carrier::Palig, palig);
    assert_eq!(out.rows[0].policy_number, "77001");

    let assistcard = "0987654321 MENA, LUIS\nCommission\n12.00\n";
    let out = registry.parse(Carrier::Assistcard, assistcard);
    assert_eq!(out.rows[0].policy_number, "0987654321");
    assert_eq!(out.rows[0].gross_cents, 1200);
}

#[test]
fn palig_minimum_policy_length_comes_from_settings() {
    let settings: CarrierSettings = toml::from_str(
        r#"
        [palig]
        min_policy_len = 6
        "#,
    )
    .unwrap();
    let text = "PÓLIZA / CERT\n20.00 10.00 0.00 2.00LUIS MENA 2.0077001\n";
    let out = CarrierRegistry::new(&settings).parse(Carrier::Palig, text);
    assert!(out.rows.is_empty());
    assert_eq!(out.stats.dropped[&DropReason::ShortPolicy], 1);
}
