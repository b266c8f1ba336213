//! End-to-end extraction over realistic OCR token pages.

use std::collections::BTreeSet;
use std::io::Write;

use otchet_core::statement::rules::is_code_shaped;
use otchet_core::{
    CodeList, DateSource, DuplicatePolicy, ExtractionError, ExtractionResult, InputFormat,
    OcrDocument, ReportingDate, Statement, StatementExtractor, StatementForm, StatementParser,
};
use pretty_assertions::assert_eq;

fn pages(tokens: &[&str]) -> Vec<Vec<String>> {
    vec![tokens.iter().map(|t| t.to_string()).collect()]
}

fn date(y: i32, m: u32, d: u32) -> ReportingDate {
    ReportingDate::from_parts(y, m, d)
}

fn column_dates(statement: &Statement) -> Vec<ReportingDate> {
    statement.columns.iter().map(|c| c.date).collect()
}

fn balance_sheet() -> Vec<Vec<String>> {
    let header = [
        "Бухгалтерский баланс",
        "на 30 сентября 2024 г.",
        "Коды",
        "Форма по ОКУД",
        "0710001",
        "Дата (число, месяц, год)",
        "30",
        "09",
        "2024",
        "Организация",
        "ООО «Ромашка»",
        "ИНН",
        "7701234567",
        "Единица измерения: в тыс. рублей",
        "384",
    ];
    let table = [
        "Пояснения",
        "Наименование показателя",
        "Код",
        "На 30 сентября",
        "2024 г.",
        "На 31 декабря",
        "2023 г.",
        "На 31 декабря",
        "2022 г.",
        "АКТИВ",
        "I. ВНЕОБОРОТНЫЕ АКТИВЫ",
        "Нематериальные активы",
        "1110",
        "1 200",
        "1 350",
        "1 500",
        "Основные средства",
        "1150",
        "37 992",
        "24100",
        "26 048",
        "Итого по разделу I",
        "1100",
        "39 192",
        "25 450",
        "27 548",
        "Запасы",
        "1210",
        "(150)",
        "-",
        "320",
        "ПАССИВ",
        "Уставный капитал",
        "1310",
        "10",
        "10",
        "10",
        "Баланс",
        "1700",
        "39 052",
        "25 460",
        "27 878",
    ];
    vec![
        header.iter().map(|t| t.to_string()).collect(),
        table.iter().map(|t| t.to_string()).collect(),
    ]
}

fn income_statement() -> Vec<Vec<String>> {
    pages(&[
        "Отчет о финансовых результатах",
        "за Январь - Сентябрь 2024 г.",
        "Форма по ОКУД",
        "0710002",
        "Наименование показателя",
        "Код",
        "За Январь - Сентябрь 2024 г.",
        "За Январь - Сентябрь 2023 г.",
        "Выручка",
        "2110",
        "125 400",
        "98 700",
        "Себестоимость продаж",
        "2120",
        "(80 100)",
        "(61 250)",
        "Валовая прибыль (убыток)",
        "2100",
        "45 300",
        "37 450",
        "Прочие доходы",
        "2340",
        "-",
        "-",
        "7018",
        "Чистая прибыль (убыток)",
        "2400",
        "12 000",
        "9 000",
    ])
}

#[test]
fn test_balance_sheet() {
    let statement = StatementParser::new().extract(&balance_sheet()).unwrap();

    assert_eq!(statement.form, StatementForm::Balance);
    assert_eq!(
        column_dates(&statement),
        vec![date(2024, 9, 30), date(2023, 12, 31), date(2022, 12, 31)]
    );
    assert!(statement.columns.iter().all(|c| c.source == DateSource::Resolved));
    assert_eq!(
        statement.codes(),
        vec!["1110", "1150", "1100", "1210", "1310", "1700"]
    );

    let sums: Vec<i64> = statement.items_for("1210").map(|i| i.sum).collect();
    assert_eq!(sums, vec![-150, 0, 320]);
    assert_eq!(statement.sum_at("1700", &date(2022, 12, 31)), Some(27878));
    assert!(statement.warnings.is_empty());
}

#[test]
fn test_income_statement() {
    let statement = StatementParser::new().extract(&income_statement()).unwrap();

    assert_eq!(statement.form, StatementForm::IncomeStatement);
    assert_eq!(column_dates(&statement), vec![date(2024, 9, 30), date(2023, 9, 30)]);

    // 2100 reads as a year and needs the reference list.
    assert_eq!(statement.codes(), vec!["2110", "2120", "2340", "2400"]);
    assert_eq!(statement.sum_at("2120", &date(2024, 9, 30)), Some(-80100));
    assert_eq!(statement.sum_at("2340", &date(2024, 9, 30)), Some(0));
    assert_eq!(statement.sum_at("2340", &date(2023, 9, 30)), Some(7018));
}

#[test]
fn test_reference_list_admits_year_shaped_codes() {
    let codes = CodeList::parse("2100\n2110\n2120\n2340\n2400\n");
    let statement = StatementParser::new()
        .with_codes(codes)
        .extract(&income_statement())
        .unwrap();

    assert_eq!(statement.codes(), vec!["2110", "2120", "2100", "2340", "2400"]);
    assert_eq!(statement.sum_at("2100", &date(2023, 9, 30)), Some(37450));
}

#[test]
fn test_scenario_balance_values() {
    let statement = StatementParser::new()
        .extract(&pages(&[
            "БУХГАЛТЕРСКИЙ БАЛАНС",
            "Финансовые вложения",
            "1150",
            "37 992",
            "24100",
            "26 048",
        ]))
        .unwrap();

    assert_eq!(statement.column_count(), 3);
    let sums: Vec<i64> = statement.items_for("1150").map(|i| i.sum).collect();
    assert_eq!(sums, vec![37992, 24100, 26048]);
}

#[test]
fn test_latin1_mojibake_keeps_context_gate() {
    let latin1 = |s: &str| -> String { s.bytes().map(char::from).collect() };
    let document = vec![vec![
        latin1("Бухгалтерский баланс"),
        latin1("Финансовые вложения"),
        "1150".to_string(),
        "37 992".to_string(),
        "24100".to_string(),
        "26 048".to_string(),
    ]];

    let statement = StatementParser::new().extract(&document).unwrap();

    assert_eq!(statement.codes(), vec!["1150"]);
    let sums: Vec<i64> = statement.items_for("1150").map(|i| i.sum).collect();
    assert_eq!(sums, vec![37992, 24100, 26048]);
}

#[test]
fn test_report_date_cells() {
    let statement = StatementParser::new()
        .extract(&pages(&[
            "Бухгалтерский баланс",
            "Дата (число, месяц, год)",
            "31",
            "03",
            "2024",
            "Запасы",
            "1210",
            "1",
            "2",
            "3",
        ]))
        .unwrap();

    assert_eq!(statement.columns[0].date, date(2024, 3, 31));
    assert_eq!(statement.columns[0].source, DateSource::Resolved);
    assert_eq!(statement.sum_at("1210", &date(2024, 3, 31)), Some(1));
    assert_eq!(statement.sum_at("1210", &date(2022, 12, 31)), Some(3));
}

#[test]
fn test_scenario_dash_is_zero() {
    let statement = StatementParser::new()
        .extract(&pages(&[
            "Отчет о финансовых результатах",
            "Прочие доходы",
            "2510",
            "-",
            "-",
            "7018",
        ]))
        .unwrap();

    assert_eq!(statement.column_count(), 2);
    let sums: Vec<i64> = statement.items_for("2510").map(|i| i.sum).collect();
    assert_eq!(sums, vec![0, 7018]);
}

#[test]
fn test_scenario_no_letters_skips_gate() {
    let statement = StatementParser::new()
        .extract(&pages(&["test", "1110", "1310"]))
        .unwrap();

    assert_eq!(statement.codes(), vec!["1110", "1310"]);
    assert_eq!(statement.items.len(), 6);
    assert!(statement.items.iter().all(|i| i.sum == 0));
    assert!(statement.columns.iter().all(|c| c.source == DateSource::Defaulted));
}

#[test]
fn test_scenario_quoted_code_list() {
    let content = "['1110', '1120', '1130', '1150', '1170', '1190']";
    let document = OcrDocument::parse(content, InputFormat::Auto).unwrap();
    let statement = StatementParser::new().extract_document(&document).unwrap();

    assert_eq!(statement.codes(), vec!["1110", "1120", "1130", "1150", "1170", "1190"]);
    assert_eq!(
        column_dates(&statement),
        vec![date(2024, 9, 30), date(2023, 12, 31), date(2022, 12, 31)]
    );
    assert_eq!(statement.items.len(), 18);
    assert!(statement.items.iter().all(|i| i.sum == 0));
}

#[test]
fn test_scenario_empty_input() {
    let result: ExtractionResult = StatementParser::new().extract_pages(&[[""; 0]]).into();

    assert_eq!(result.error.as_deref(), Some("no valid lines found"));
    assert!(result.items.is_empty());

    let err = StatementParser::new().extract(&[vec![]]).unwrap_err();
    assert_eq!(err, ExtractionError::EmptyInput);
}

#[test]
fn test_scenario_reference_list_containment() {
    let codes: CodeList = ["2510", "2520", "2530", "9999"].into_iter().collect();
    let statement = StatementParser::new()
        .with_codes(codes.clone())
        .extract(&pages(&[
            "Отчет о финансовых результатах",
            "Проценты к получению",
            "2510",
            "100",
            "200",
            "Проценты к уплате",
            "2520",
            "(50)",
            "(40)",
            "Прочие доходы",
            "2340",
            "5",
            "6",
        ]))
        .unwrap();

    let emitted = statement.codes();
    assert!(!emitted.contains(&"9999"));
    assert!(emitted.iter().all(|code| codes.contains(code)));
    // Every listed code present in the input is emitted.
    assert_eq!(emitted, vec!["2510", "2520"]);
}

#[test]
fn test_failed_extraction_record() {
    let result = StatementParser::new()
        .extract_result(&[["Страница", "без", "таблицы"]]);

    assert_eq!(
        result.error.as_deref(),
        Some("Не удалось извлечь структурированные данные из документа")
    );
    assert!(result.items.is_empty());
    assert_eq!(
        result.diagnostics,
        Some(vec!["Страница".to_string(), "без".to_string(), "таблицы".to_string()])
    );

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["items"], serde_json::json!([]));
}

#[test]
fn test_deterministic_output() {
    let parser = StatementParser::new();
    let first = serde_json::to_string(&parser.extract_result(&balance_sheet())).unwrap();
    let second = serde_json::to_string(&parser.extract_result(&balance_sheet())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_items_are_dense_and_well_formed() {
    let parser = StatementParser::new();
    for document in [balance_sheet(), income_statement()] {
        let statement = parser.extract(&document).unwrap();
        let columns = statement.column_count();
        assert!((1..=3).contains(&columns));

        for code in statement.codes() {
            assert!(is_code_shaped(code));
            let dates: BTreeSet<String> =
                statement.items_for(code).map(|i| i.date.to_string()).collect();
            assert_eq!(statement.items_for(code).count(), columns);
            assert_eq!(dates.len(), columns);
        }
    }
}

#[test]
fn test_page_boundaries_only_order() {
    let joined = StatementParser::new().extract(&balance_sheet()).unwrap();

    let split: Vec<Vec<String>> = balance_sheet()
        .concat()
        .chunks(7)
        .map(|chunk| chunk.to_vec())
        .collect();
    let rechunked = StatementParser::new().extract(&split).unwrap();

    assert_eq!(joined, rechunked);
}

#[test]
fn test_duplicate_code_policies() {
    let document = pages(&[
        "Содержание",
        "Запасы",
        "1210",
        "Бухгалтерский баланс",
        "Запасы",
        "1210",
        "500",
        "400",
        "300",
    ]);

    let independent = StatementParser::new().extract(&document).unwrap();
    assert_eq!(independent.items.len(), 6);

    let last = StatementParser::new()
        .with_duplicate_policy(DuplicatePolicy::LastWins)
        .extract(&document)
        .unwrap();
    let sums: Vec<i64> = last.items.iter().map(|i| i.sum).collect();
    assert_eq!(sums, vec![500, 400, 300]);

    let first = StatementParser::new()
        .with_duplicate_policy(DuplicatePolicy::FirstWins)
        .extract(&document)
        .unwrap();
    let sums: Vec<i64> = first.items.iter().map(|i| i.sum).collect();
    assert_eq!(sums, vec![0, 0, 0]);
}

#[test]
fn test_load_and_extract_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::json!({ "pages": [{ "rec_texts": balance_sheet().concat() }] });
    file.write_all(json.to_string().as_bytes()).unwrap();

    let document = OcrDocument::from_file(file.path(), InputFormat::Auto).unwrap();
    assert_eq!(document.page_count(), 1);

    let statement = StatementParser::new().extract_document(&document).unwrap();
    assert_eq!(statement.form, StatementForm::Balance);
    assert_eq!(statement.codes().len(), 6);
}
