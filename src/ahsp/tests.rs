use super::extract::HeaderProbe;
use super::matcher::normalize_for_containment;
use super::numeric::parse_coefficient;
use super::*;
use crate::model::{Category, MatchTier, PriceResolution, PriceTable, ResourceMap, WorkItem};

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn labor_only_item() -> WorkItem {
    let mut item = WorkItem::new("T.01", "Galian Tanah Biasa", Some("m3"));
    item.resources.labor.upsert("Pekerja", 0.5);
    item
}

#[test]
fn normalize_number_reads_indonesian_and_plain_forms() {
    assert_eq!(normalize_number("1.000,00"), 1000.0);
    assert_eq!(normalize_number("0,05"), 0.05);
    assert_eq!(normalize_number("abc"), 0.0);
    assert_eq!(normalize_number("Rp 15.000"), 15000.0);
    assert_eq!(normalize_number("Rp. 1.250.000,-"), 1_250_000.0);
    assert_eq!(normalize_number("IDR 2.500,50"), 2500.5);
    assert_eq!(normalize_number("12,5"), 12.5);
    assert_eq!(normalize_number(""), 0.0);
    assert_eq!(normalize_number("   "), 0.0);
}

#[test]
fn normalize_number_keeps_coefficient_style_periods_as_decimals() {
    assert_eq!(normalize_number("0.750"), 0.75);
    assert_eq!(normalize_number("0.025"), 0.025);
    assert_eq!(normalize_number("1.5"), 1.5);
    assert_eq!(normalize_number("1.0250"), 1.025);
    assert_eq!(normalize_number("15.000"), 15000.0);
    assert_eq!(normalize_number("1.250.000"), 1_250_000.0);
}

#[test]
fn normalize_number_rejects_codes_and_mixed_text() {
    assert_eq!(normalize_number("L.01"), 0.0);
    assert_eq!(normalize_number("50kg"), 0.0);
    assert_eq!(normalize_number("1.2.3"), 0.0);
    assert!(!is_numeric_text("L.01"));
    assert!(!is_numeric_text("OH"));
    assert!(is_numeric_text("0,750"));
    assert!(is_numeric_text("Rp 12.500"));
}

#[test]
fn normalize_number_accepts_english_grouping_with_single_trailing_period() {
    assert_eq!(normalize_number("1,250.50"), 1250.5);
    assert_eq!(normalize_number("1,250,000"), 1_250_000.0);
}

#[test]
fn format_coefficient_round_trips_through_normalizer() {
    for value in [1.047, 0.025, 371.0, 0.5, 12.75] {
        assert_eq!(normalize_number(&format_coefficient(value)), value);
    }
    assert_eq!(format_coefficient(1.047), "1,047");
    assert_eq!(format_coefficient(371.0), "371");
}

#[test]
fn resource_line_parser_splits_names_and_coefficients() {
    let parser = ResourceLineParser::new().expect("regex should compile");

    let parsed = parser.parse(Some("Pekerja (L.01) 0.750 OH; Mandor (L.04) 0.025 OH"));
    let expected: ResourceMap = [("Pekerja (L.01)", 0.75), ("Mandor (L.04)", 0.025)]
        .into_iter()
        .collect();
    assert_eq!(parsed, expected);

    let parsed = parser.parse(Some("Semen 50kg; Pasir 0.5"));
    let expected: ResourceMap = [("Semen", 50.0), ("Pasir", 0.5)].into_iter().collect();
    assert_eq!(parsed, expected);
}

#[test]
fn resource_line_parser_treats_placeholders_as_empty() {
    let parser = ResourceLineParser::new().expect("regex should compile");

    assert!(parser.parse(None).is_empty());
    assert!(parser.parse(Some("-")).is_empty());
    assert!(parser.parse(Some("")).is_empty());
    assert!(parser.parse(Some("   ")).is_empty());
}

#[test]
fn resource_line_parser_drops_segments_without_numbers() {
    let parser = ResourceLineParser::new().expect("regex should compile");

    let parsed = parser.parse(Some("Pasir Pasang; ; Kerikil 1,029 m3"));
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed.get("Kerikil"), Some(1.029));
}

#[test]
fn resource_line_parser_last_duplicate_wins() {
    let parser = ResourceLineParser::new().expect("regex should compile");

    let parsed = parser.parse(Some("Pekerja 0.5; Mandor 0.05; Pekerja 0.75"));
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.get("Pekerja"), Some(0.75));
    assert_eq!(
        parsed.iter().map(|entry| entry.name.as_str()).collect::<Vec<_>>(),
        vec!["Pekerja", "Mandor"]
    );
}

#[test]
fn resource_line_parser_reads_single_period_as_decimal_mark() {
    let parser = ResourceLineParser::new().expect("regex should compile");

    let parsed = parser.parse(Some("Pekerja 1.500;Batu Kali 1.200;Kerikil 1.029"));
    let expected: ResourceMap = [("Pekerja", 1.5), ("Batu Kali", 1.2), ("Kerikil", 1.029)]
        .into_iter()
        .collect();
    assert_eq!(parsed, expected);

    approx(parse_coefficient("1,500"), 1.5);
    approx(parse_coefficient("0.750"), 0.75);
    approx(parse_coefficient("1.250.000"), 1_250_000.0);
    approx(parse_coefficient("1.000,5"), 1_000.5);
}

#[test]
fn resource_line_parser_keeps_digits_inside_names() {
    let parser = ResourceLineParser::new().expect("regex should compile");

    let parsed = parser.parse(Some("Keramik 40x40 1,05; Semen 50kg 0.12"));
    assert_eq!(parsed.get("Keramik 40x40"), Some(1.05));
    assert_eq!(parsed.get("Semen 50kg"), Some(0.12));
}

#[test]
fn resource_detail_formatting_reads_back_through_parser() {
    let parser = ResourceLineParser::new().expect("regex should compile");
    let resources: ResourceMap = [("Semen PC", 371.0), ("Pasir Beton", 0.698), ("Kerikil", 1.047)]
        .into_iter()
        .collect();

    let detail = format_resource_detail(&resources);
    assert_eq!(detail, "Semen PC 371; Pasir Beton 0,698; Kerikil 1,047");
    assert_eq!(parser.parse(Some(&detail)), resources);
    assert_eq!(format_resource_detail(&ResourceMap::new()), "-");
}

#[test]
fn header_predicate_reads_code_description_and_unit() {
    let scanner = GridScanner::new().expect("regex should compile");

    let probe = scanner.match_header(&row(&["", "3.13.1", "Galian tanah biasa sedalam 1 m", "m3"]));
    let Some(HeaderProbe::Accepted(header)) = &probe else {
        panic!("expected accepted header, got {probe:?}");
    };
    assert_eq!(header.code, "3.13.1");
    assert_eq!(header.description, "Galian tanah biasa sedalam 1 m");
    assert_eq!(header.unit.as_deref(), Some("m3"));
}

#[test]
fn header_predicate_defaults_unit_when_missing() {
    let scanner = GridScanner::new().expect("regex should compile");

    let probe = scanner.match_header(&row(&["A.4.4.1", "Pasangan Dinding Bata Merah", "keterangan"]));
    let Some(HeaderProbe::Accepted(header)) = &probe else {
        panic!("expected accepted header, got {probe:?}");
    };
    assert!(header.unit.is_none());

    let grid = [row(&["A.4.4.1", "Pasangan Dinding Bata Merah"])];
    let (items, _) = scanner.extract_with_stats(&grid);
    assert_eq!(items[0].unit, crate::model::DEFAULT_UNIT);
}

#[test]
fn header_predicate_rejects_summary_lines() {
    let scanner = GridScanner::new().expect("regex should compile");

    let probe = scanner.match_header(&row(&["1.1", "Jumlah Harga Tenaga Kerja", "150.000"]));
    assert!(matches!(probe, Some(HeaderProbe::Rejected { .. })));

    let probe = scanner.match_header(&row(&["2.1", "ANALISA HARGA SATUAN PEKERJAAN"]));
    assert!(matches!(probe, Some(HeaderProbe::Rejected { .. })));
}

#[test]
fn code_predicate_rejects_numbers_and_long_tokens() {
    let scanner = GridScanner::new().expect("regex should compile");

    assert!(scanner.is_work_item_code("T.01"));
    assert!(scanner.is_work_item_code("Div.3.2"));
    assert!(scanner.is_work_item_code("A.4.4.1."));
    assert!(!scanner.is_work_item_code("0.750"));
    assert!(!scanner.is_work_item_code("Pekerja"));
    assert!(!scanner.is_work_item_code("1.2.3.4.5.6.7.8.9.10.11.12"));
}

#[test]
fn category_predicate_reads_markers_and_skips_totals() {
    let scanner = GridScanner::new().expect("regex should compile");

    assert_eq!(scanner.detect_category(&row(&["A", "TENAGA"])), Some(Category::Labor));
    assert_eq!(scanner.detect_category(&row(&["B", "Bahan"])), Some(Category::Material));
    assert_eq!(
        scanner.detect_category(&row(&["C", "PERALATAN"])),
        Some(Category::Equipment)
    );
    assert_eq!(scanner.detect_category(&row(&["", "Jumlah Harga Tenaga"])), None);
    assert_eq!(scanner.detect_category(&row(&["", "Total Bahan"])), None);
    assert_eq!(scanner.detect_category(&row(&["4", "Alat Bantu", "ls", "1"])), None);
    assert_eq!(
        scanner.detect_category(&row(&["A", "TENAGA KERJA", "", "", "93.750"])),
        Some(Category::Labor)
    );
}

#[test]
fn extract_accepts_category_rows_carrying_block_amounts() {
    let scanner = GridScanner::new().expect("regex should compile");
    let grid = vec![
        row(&["T.01", "Galian Tanah", "m3"]),
        row(&["A", "TENAGA", "", "", "93.750"]),
        row(&["Pekerja", "0,750"]),
        row(&["B", "BAHAN", "", "", "120.000"]),
        row(&["Semen", "50"]),
    ];

    let (items, stats) = scanner.extract_with_stats(&grid);
    assert_eq!(items.len(), 1);
    assert_eq!(stats.category_switches, 2);
    assert_eq!(
        items[0].resources.labor,
        [("Pekerja", 0.75)].into_iter().collect::<ResourceMap>()
    );
    assert_eq!(
        items[0].resources.material,
        [("Semen", 50.0)].into_iter().collect::<ResourceMap>()
    );
    assert!(items[0].resources.equipment.is_empty());
}

#[test]
fn resource_predicate_skips_numbers_units_and_codes() {
    let scanner = GridScanner::new().expect("regex should compile");

    let found = scanner.match_resource_row(&row(&["1", "Pekerja", "L.01", "OH", "0,750", "120.000"]));
    assert_eq!(found, Some(("Pekerja".to_string(), 0.75)));

    let found = scanner.match_resource_row(&row(&["2", "OH", "Mandor", "0,025"]));
    assert_eq!(found, Some(("Mandor".to_string(), 0.025)));

    assert_eq!(scanner.match_resource_row(&row(&["", "Jumlah Harga Bahan", "0,5"])), None);
    assert_eq!(scanner.match_resource_row(&row(&["Pekerja", "OH", "-"])), None);
    assert_eq!(scanner.match_resource_row(&row(&["Pekerja", "0"])), None);
}

#[test]
fn extract_reads_single_work_item_end_to_end() {
    let scanner = GridScanner::new().expect("regex should compile");
    let grid = vec![
        row(&["T.01", "Galian Tanah", "m3"]),
        row(&["A", "TENAGA"]),
        row(&["Pekerja", "0.750"]),
        row(&["B", "BAHAN"]),
        row(&["Semen", "50"]),
    ];

    let items = scanner.extract_with_stats(&grid).0;
    assert_eq!(items.len(), 1);

    let item = &items[0];
    assert_eq!(item.code, "T.01");
    assert_eq!(item.unit, "m3");
    assert_eq!(
        item.resources.labor,
        [("Pekerja", 0.75)].into_iter().collect::<ResourceMap>()
    );
    assert_eq!(
        item.resources.material,
        [("Semen", 50.0)].into_iter().collect::<ResourceMap>()
    );
    assert!(item.resources.equipment.is_empty());
}

#[test]
fn extract_splits_consecutive_items_after_block_totals() {
    let scanner = GridScanner::new().expect("regex should compile");
    let grid = vec![
        row(&["REKAPITULASI ANALISA", "", ""]),
        row(&["No", "Uraian", "Kode", "Satuan", "Koefisien"]),
        row(&["3.1.1", "Galian tanah biasa sedalam 1 m", "m3"]),
        row(&["A", "TENAGA KERJA"]),
        row(&["1", "Pekerja", "L.01", "OH", "0,750"]),
        row(&["2", "Mandor", "L.04", "OH", "0,025"]),
        row(&["", "JUMLAH HARGA TENAGA KERJA", "", "", "", "93.750"]),
        row(&[]),
        row(&["3.1.2", "Pasangan batu kali campuran 1:4", "m3"]),
        row(&["A", "TENAGA KERJA"]),
        row(&["1", "Pekerja", "L.01", "OH", "1,500"]),
        row(&["B", "BAHAN"]),
        row(&["1", "Batu Kali", "", "m3", "1,200"]),
        row(&["2", "Semen Portland", "", "kg", "163"]),
        row(&["C", "PERALATAN"]),
        row(&["1", "Alat Bantu", "", "ls", "1"]),
        row(&["", "JUMLAH HARGA PERALATAN"]),
        row(&["D", "Jumlah (A+B+C)"]),
    ];

    let (items, stats) = scanner.extract_with_stats(&grid);
    assert_eq!(items.len(), 2);
    assert_eq!(stats.headers_accepted, 2);
    assert_eq!(stats.blocks_closed, 2);

    assert_eq!(items[0].code, "3.1.1");
    assert_eq!(items[0].resources.labor.get("Pekerja"), Some(0.75));
    assert_eq!(items[0].resources.labor.get("Mandor"), Some(0.025));

    assert_eq!(items[1].code, "3.1.2");
    assert_eq!(items[1].resources.labor.get("Pekerja"), Some(1.5));
    assert_eq!(items[1].resources.material.get("Batu Kali"), Some(1.2));
    assert_eq!(items[1].resources.material.get("Semen Portland"), Some(163.0));
    assert_eq!(items[1].resources.equipment.get("Alat Bantu"), Some(1.0));
}

#[test]
fn extract_ignores_headers_inside_open_resource_block() {
    let scanner = GridScanner::new().expect("regex should compile");
    let grid = vec![
        row(&["T.01", "Galian Tanah Biasa", "m3"]),
        row(&["TENAGA"]),
        row(&["1.1", "Pekerja terampil", "0,5"]),
    ];

    let items = scanner.extract_with_stats(&grid).0;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].resources.labor.get("Pekerja terampil"), Some(0.5));
}

#[test]
fn extract_returns_empty_catalog_without_headers() {
    let scanner = GridScanner::new().expect("regex should compile");
    let grid = vec![
        row(&["REKAP BBS", "", ""]),
        row(&["Pekerja", "0,75"]),
        row(&["TENAGA"]),
    ];

    assert!(scanner.extract_with_stats(&grid).0.is_empty());
    assert!(scanner.extract_with_stats(&[]).0.is_empty());
}

#[test]
fn matcher_prefers_exact_tiers_over_containment() {
    let prices: PriceTable = [("semen", 1000.0), ("semen portland", 1500.0)]
        .into_iter()
        .collect();

    let found = match_price("Semen", &prices);
    assert_eq!(found.resolution, PriceResolution::Resolved(1000.0));
    assert_eq!(found.tier, Some(MatchTier::CaseInsensitive));

    let found = match_price("semen portland", &prices);
    assert_eq!(found.price(), 1500.0);
    assert_eq!(found.tier, Some(MatchTier::Exact));
}

#[test]
fn matcher_falls_back_to_normalized_containment() {
    let prices: PriceTable = [("semen portland", 1500.0)].into_iter().collect();

    let found = match_price("Semen (PC)", &prices);
    assert_eq!(found.price(), 1500.0);
    assert_eq!(found.tier, Some(MatchTier::Containment));
    assert_eq!(found.matched_key.as_deref(), Some("semen portland"));

    let prices: PriceTable = [("Pekerja", 100_000.0)].into_iter().collect();
    assert_eq!(match_price("Pekerja (L.01)", &prices).price(), 100_000.0);
}

#[test]
fn matcher_reports_unresolved_separately_from_zero_price() {
    let prices: PriceTable = [("Air", 0.0)].into_iter().collect();

    let free = match_price("Air", &prices);
    assert_eq!(free.resolution, PriceResolution::Resolved(0.0));
    assert!(free.resolution.is_resolved());

    let missing = match_price("Kerikil", &prices);
    assert_eq!(missing.resolution, PriceResolution::Unresolved);
    assert_eq!(missing.price(), 0.0);
    assert!(!missing.resolution.is_resolved());
}

#[test]
fn matcher_containment_takes_first_table_entry() {
    let prices: PriceTable = [("Pasir Beton", 250_000.0), ("Pasir Pasang", 280_000.0)]
        .into_iter()
        .collect();

    assert_eq!(match_price("Pasir", &prices).price(), 250_000.0);
    assert_eq!(normalize_for_containment("  Semen  (PC) Tiga Roda "), "semen tiga roda");
}

#[test]
fn pricing_applies_overhead_then_tax() {
    let prices: PriceTable = [("Pekerja", 100_000.0)].into_iter().collect();
    let rates = MarkupRates {
        overhead_pct: 15.0,
        tax_pct: 11.0,
    };

    let line = price_work_item(&labor_only_item(), 10.0, &prices, rates).expect("valid inputs");
    approx(line.subtotal_labor, 50_000.0);
    approx(line.subtotal_material, 0.0);
    approx(line.subtotal_equipment, 0.0);
    approx(line.base_direct_cost, 50_000.0);
    approx(line.overhead_amount, 7_500.0);
    approx(line.unit_price_pre_tax, 57_500.0);
    approx(line.tax_amount, 6_325.0);
    approx(line.unit_price_final, 63_825.0);
    approx(line.line_total, 638_250.0);
    assert!(line.unresolved_resources().is_empty());
}

#[test]
fn pricing_is_a_pure_function_of_its_inputs() {
    let prices: PriceTable = [("Pekerja", 123_456.789)].into_iter().collect();

    let first = price_work_item(&labor_only_item(), 3.3, &prices, MarkupRates::default())
        .expect("valid inputs");
    let second = price_work_item(&labor_only_item(), 3.3, &prices, MarkupRates::default())
        .expect("valid inputs");

    assert_eq!(first, second);
    assert_eq!(first.line_total.to_bits(), second.line_total.to_bits());
}

#[test]
fn pricing_keeps_unresolved_resources_visible() {
    let mut item = labor_only_item();
    item.resources.material.upsert("Kerikil", 1.029);
    let prices: PriceTable = [("Pekerja", 100_000.0)].into_iter().collect();

    let line = price_work_item(&item, 1.0, &prices, MarkupRates::default()).expect("valid inputs");
    assert_eq!(line.subtotal_material, 0.0);
    assert_eq!(line.unresolved_resources(), vec![(Category::Material, "Kerikil")]);
    assert_eq!(
        line.resolved_prices.material[0].resolution,
        PriceResolution::Unresolved
    );
}

#[test]
fn pricing_item_without_resources_costs_nothing() {
    let item = WorkItem::new("X.1", "Pekerjaan persiapan", None);

    let line = price_work_item(&item, 2.0, &PriceTable::new(), MarkupRates::default())
        .expect("valid inputs");
    assert_eq!(line.base_direct_cost, 0.0);
    assert_eq!(line.line_total, 0.0);
}

#[test]
fn pricing_rejects_non_positive_volume_and_bad_rates() {
    let prices = PriceTable::new();

    for volume in [0.0, -1.0, f64::NAN] {
        let err = price_work_item(&labor_only_item(), volume, &prices, MarkupRates::default())
            .expect_err("volume must be rejected");
        assert!(matches!(err, PricingError::InvalidVolume { .. }));
    }

    let rates = MarkupRates {
        overhead_pct: -5.0,
        tax_pct: 11.0,
    };
    let err = price_work_item(&labor_only_item(), 1.0, &prices, rates).expect_err("bad rate");
    assert!(matches!(err, PricingError::InvalidRate { label: "overhead", .. }));
}

#[test]
fn catalog_lookup_of_unknown_code_is_an_error() {
    let (catalog, warnings) = Catalog::from_items(vec![labor_only_item()]);
    assert!(warnings.is_empty());

    assert_eq!(catalog.get(" T.01 ").map(|item| item.code.as_str()), Ok("T.01"));
    assert_eq!(
        catalog.get("Z.99"),
        Err(PricingError::UnknownWorkItem {
            code: "Z.99".to_string()
        })
    );
}

#[test]
fn catalog_keeps_first_of_duplicate_codes() {
    let mut duplicate = labor_only_item();
    duplicate.description = "Galian ulang".to_string();

    let (catalog, warnings) = Catalog::from_items(vec![labor_only_item(), duplicate]);
    assert_eq!(catalog.len(), 1);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        catalog.get("T.01").map(|item| item.description.as_str()),
        Ok("Galian Tanah Biasa")
    );
}

#[test]
fn rollup_sums_line_totals_and_clears() {
    let prices: PriceTable = [("Pekerja", 100.0)].into_iter().collect();
    let rates = MarkupRates {
        overhead_pct: 0.0,
        tax_pct: 0.0,
    };
    let mut item = WorkItem::new("T.01", "Galian Tanah Biasa", Some("m3"));
    item.resources.labor.upsert("Pekerja", 1.0);

    let first = price_work_item(&item, 1.0, &prices, rates).expect("valid inputs");
    let second = price_work_item(&item, 2.5, &prices, rates).expect("valid inputs");
    approx(first.line_total, 100.0);
    approx(second.line_total, 250.0);

    let mut rollup = ProjectRollup::new();
    assert!(rollup.is_empty());
    assert_eq!(rollup.grand_total(), 0.0);

    rollup.append(first);
    rollup.append(second);
    assert_eq!(rollup.len(), 2);
    approx(rollup.grand_total(), 350.0);

    rollup.clear();
    assert!(rollup.is_empty());
    assert_eq!(rollup.grand_total(), 0.0);
}

#[test]
fn rollup_category_totals_scale_by_volume() {
    let prices: PriceTable = [("Pekerja", 100_000.0), ("Semen", 1_500.0)]
        .into_iter()
        .collect();
    let mut item = labor_only_item();
    item.resources.material.upsert("Semen", 10.0);

    let mut rollup = ProjectRollup::new();
    rollup.append(price_work_item(&item, 10.0, &prices, MarkupRates::default()).expect("valid"));
    rollup.append(price_work_item(&item, 2.0, &prices, MarkupRates::default()).expect("valid"));

    let totals = rollup.totals();
    approx(totals.labor, 50_000.0 * 12.0);
    approx(totals.material, 15_000.0 * 12.0);
    approx(totals.equipment, 0.0);
    approx(totals.direct_cost, 65_000.0 * 12.0);
    approx(totals.grand_total, rollup.grand_total());
    approx(
        totals.direct_cost + totals.overhead + totals.tax,
        totals.grand_total,
    );
    assert_eq!(rollup.line_items()[0].volume, 10.0);
    assert_eq!(rollup.line_items()[1].volume, 2.0);
}
