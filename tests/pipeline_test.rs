use invest_pipeline::config::Config;
use invest_pipeline::pipeline::Pipeline;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const MESSAGES_HTML: &str = r#"<html><body>
  <div class="message service" id="message1">
    <div class="body details">5 августа 2026</div>
  </div>
  <div class="message default clearfix" id="message2">
    <div class="pull_right date details" title="05.08.2026 14:23:01 UTC+03:00">14:23</div>
    <div class="body">
      <div class="text">Апарт-отель Чайка в Адлере: загрузка 71% круглый год, управляющая компания на месте.</div>
      <a class="photo_wrap" href="photos/chayka_45.jpg"><img class="photo" src="photos/chayka_45_thumb.jpg"></a>
    </div>
  </div>
  <div class="message default clearfix" id="message3">
    <div class="pull_right date details" title="06.08.2026 09:00:00 UTC+03:00">09:00</div>
    <div class="body"><div class="text">ок</div></div>
  </div>
  <div class="message default clearfix" id="message4">
    <div class="pull_right date details" title="06.08.2026 11:40:00 UTC+03:00">11:40</div>
    <div class="body">
      <div class="text">«Лагуна»: апартаменты у моря от 5 млн рублей, площадью 28 кв.м, доходность 12% годовых. Бронирование открыто.</div>
    </div>
  </div>
  <div class="message default clearfix" id="message5">
    <div class="pull_right date details" title="07.08.2026 10:05:00 UTC+03:00">10:05</div>
    <div class="body">
      <div class="text">Студия Восход в Геленджике полностью продана, спасибо всем за заявки!</div>
    </div>
  </div>
</body></html>"#;

const LISTINGS_CSV: &str = "\
Название,Город,Цена,Площадь,Выручка на м2,Описание,Фото
Апарт-отель Чайка,Сочи,5 200 000,28,,,
Старый Пирс,Сочи,0,0,1200,\"Причальный комплекс, номера под управлением отельного оператора, детали по запросу\",photos/pier.jpg
";

const OBJECTS_JSON: &str = r#"[
  {"title": "Апарт-отель Чайка", "city": "Сочи", "adr": 4200,
   "photos": ["https://cdn.example/chayka_1.jpg"]},
  {"slug": "mayak", "title": "Маяк", "city": "Москва", "price": 12400000,
   "area": 54, "roiPercent": 9.5, "format": "квартира",
   "description": "Видовые квартиры в центре Москвы с арендным потоком и консьерж-сервисом на первом этаже.",
   "photos": ["https://cdn.example/mayak_1.jpg"]}
]"#;

fn write_sources(dir: &Path) {
    fs::write(dir.join("messages.html"), MESSAGES_HTML).unwrap();
    fs::write(dir.join("listings.csv"), LISTINGS_CSV).unwrap();
    fs::write(dir.join("objects.json"), OBJECTS_JSON).unwrap();
}

fn config_for(input: &Path, output: &Path) -> Config {
    let mut config = Config::default();
    config.input_dir = input.to_path_buf();
    config.output_dir = output.to_path_buf();
    config
}

#[tokio::test]
async fn test_full_batch_run() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_sources(input.path());

    let config = config_for(input.path(), output.path());
    let result = Pipeline::run(&config).await.unwrap();

    assert_eq!(result.sources_read, 3);
    assert!(result.source_failures.is_empty());
    assert_eq!(result.accepted, 3);
    assert_eq!(result.skipped, 2);

    let catalog: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&result.catalog_file).unwrap()).unwrap();
    let objects = catalog["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 3);

    let slugs: Vec<&str> = objects.iter().map(|o| o["slug"].as_str().unwrap()).collect();
    assert!(slugs.contains(&"apart-otel-chayka"));
    assert!(slugs.contains(&"laguna"));
    assert!(slugs.contains(&"mayak"));

    // Every reconciled object keeps price = pricePerM2 x area within 1%.
    for object in objects {
        if let (Some(price), Some(area), Some(rate)) = (
            object["price"].as_f64(),
            object["area"].as_f64(),
            object["pricePerM2"].as_f64(),
        ) {
            assert!(
                (price - rate * area).abs() / price <= 0.01,
                "closure violated for {}",
                object["slug"]
            );
        }
    }
}

#[tokio::test]
async fn test_dual_source_merge_carries_all_fields() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_sources(input.path());

    let config = config_for(input.path(), output.path());
    let result = Pipeline::run(&config).await.unwrap();

    let catalog: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&result.catalog_file).unwrap()).unwrap();
    let chayka = catalog["objects"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["slug"] == "apart-otel-chayka")
        .expect("merged project missing");

    // Price and area come from the sheet, occupancy from the message
    // export, ADR from the JSON dump: one project carries all of them.
    assert_eq!(chayka["price"].as_f64(), Some(5_200_000.0));
    assert_eq!(chayka["area"].as_f64(), Some(28.0));
    assert_eq!(chayka["occupancy"].as_f64(), Some(71.0));
    assert_eq!(chayka["adr"].as_f64(), Some(4_200.0));

    let derived: Vec<&str> = chayka["derived"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap())
        .collect();
    assert!(derived.contains(&"price_per_m2"));
    assert!(derived.contains(&"seasonality"));
}

#[tokio::test]
async fn test_text_extraction_scenario() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_sources(input.path());

    let config = config_for(input.path(), output.path());
    let result = Pipeline::run(&config).await.unwrap();

    let catalog: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&result.catalog_file).unwrap()).unwrap();
    let laguna = catalog["objects"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["slug"] == "laguna")
        .expect("text-extracted project missing");

    assert_eq!(laguna["price"].as_f64(), Some(5_000_000.0));
    assert_eq!(laguna["area"].as_f64(), Some(28.0));
    let rate = laguna["pricePerM2"].as_f64().unwrap();
    assert!((rate - 178_571.0).abs() < 150.0);
    // NOI comes from the extracted 12% headline yield.
    assert!((laguna["noiYear"].as_f64().unwrap() - 600_000.0).abs() < 1.0);
    assert_eq!(laguna["city"].as_str(), Some("Сочи"));
}

#[tokio::test]
async fn test_zero_price_row_lands_in_skip_report() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_sources(input.path());

    let config = config_for(input.path(), output.path());
    let result = Pipeline::run(&config).await.unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&result.skip_report_file).unwrap()).unwrap();
    let entries = report.as_array().unwrap();

    let pier = entries
        .iter()
        .find(|e| e["identifier"] == "sheet:2")
        .expect("zero-price row must be reported");
    assert!(pier["reason"].as_str().unwrap().contains("no price"));

    let sold = entries
        .iter()
        .find(|e| e["identifier"] == "message_export:5")
        .expect("sold listing must be reported");
    assert_eq!(sold["reason"], "listing marked sold");
}

#[tokio::test]
async fn test_missing_sources_do_not_abort_batch() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    // Only the JSON dump exists.
    fs::write(input.path().join("objects.json"), OBJECTS_JSON).unwrap();

    let config = config_for(input.path(), output.path());
    let result = Pipeline::run(&config).await.unwrap();

    assert_eq!(result.sources_read, 1);
    assert_eq!(result.source_failures.len(), 2);
    assert!(result.accepted >= 1);
}

#[tokio::test]
async fn test_no_readable_source_is_fatal() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();

    let config = config_for(input.path(), output.path());
    assert!(Pipeline::run(&config).await.is_err());
}
