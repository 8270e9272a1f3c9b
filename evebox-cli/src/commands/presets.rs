use evebox::report::PresetCatalog;
use evebox::Config;

/// Print the preset catalogue as a table
pub fn run_presets(config: &Config) {
    let catalog = PresetCatalog::with_extra(&config.report.presets);
    let name_width = catalog.iter().map(|p| p.name.len()).max().unwrap_or(4).max(4);
    let field_width = catalog.iter().map(|p| p.field.len()).max().unwrap_or(5).max(5);

    println!(
        "{:<nw$}  {:<fw$}  DESCRIPTION",
        "NAME",
        "FIELD",
        nw = name_width,
        fw = field_width
    );
    for preset in catalog.iter() {
        println!(
            "{:<nw$}  {:<fw$}  {}",
            preset.name,
            preset.field,
            preset.description,
            nw = name_width,
            fw = field_width
        );
    }
}
