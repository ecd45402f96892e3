mod analyzer;
mod extract;
mod loader;
mod models;
mod report;

use analyzer::AlumniIndex;
use anyhow::Result;
use clap::{Arg, Command};
use extract::SurveyColumns;
use models::{Config, LeadershipRecord, MatchedStudent, ProgramKind, SurveyGraduate};
use report::SurveyDetail;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    let matches = Command::new("egresados-analyzer")
        .version("1.0")
        .about("Cleans and analyzes university alumni and survey exports")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("clean")
                .about("Normalize the raw postgraduate exports into flat CSV files"),
        )
        .subcommand(
            Command::new("alumni")
                .about("Mark postgraduate students found in the historical alumni database"),
        )
        .subcommand(
            Command::new("prior-degrees")
                .about("Find students holding an earlier degree from another program"),
        )
        .subcommand(
            Command::new("leadership")
                .about("Find survey respondents in leadership positions"),
        )
        .subcommand(
            Command::new("programs")
                .about("Break leadership positions down by program and graduation year"),
        )
        .subcommand(
            Command::new("graduates")
                .about("Count all graduates by program and graduation year"),
        )
        .subcommand(
            Command::new("values")
                .about("List the distinct occupational-information values in the surveys"),
        )
        .get_matches();

    let config_file = matches.get_one::<String>("config").unwrap();

    // Load or create configuration
    let config = if Path::new(config_file).exists() {
        println!("📋 Loading configuration from: {}", config_file);
        Config::load_from_file(config_file)?
    } else {
        println!("📝 Creating default configuration file: {}", config_file);
        let default_config = Config::default();
        default_config.save_to_file(config_file)?;
        println!(
            "⚠️  Please edit {} to match your data layout, then run the program again.",
            config_file
        );
        return Ok(());
    };

    match matches.subcommand() {
        Some(("clean", _)) => run_clean(&config),
        Some(("alumni", _)) => run_alumni(&config),
        Some(("prior-degrees", _)) => run_prior_degrees(&config),
        Some(("leadership", _)) => run_leadership(&config),
        Some(("programs", _)) => run_programs(&config),
        Some(("graduates", _)) => run_graduates(&config),
        Some(("values", _)) => run_values(&config),
        _ => unreachable!(),
    }
}

fn banner(title: &str) {
    println!("{}", "=".repeat(80));
    println!("{}", title);
    println!("{}", "=".repeat(80));
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}..", cut)
    } else {
        text.to_string()
    }
}

fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        value.trim().to_string()
    }
}

fn run_clean(config: &Config) -> Result<()> {
    banner("CLEANING RAW POSTGRADUATE EXPORTS");

    let mut all_records = Vec::new();

    for year in config.years() {
        let path = config.posgrado_file(year);
        if !path.exists() {
            println!("⚠️  File not found: {}", path.display());
            continue;
        }

        println!("\n📄 Processing: {} - year {}", path.display(), year);

        let table = match loader::load_table(&path, b';') {
            Ok(table) => table,
            Err(error) => {
                println!("❌ Error reading {}: {}", path.display(), error);
                continue;
            }
        };

        let records = extract::scan_posgrado_table(&table, year);
        println!("✓ Students processed: {}", records.len());

        if !records.is_empty() {
            let mut by_program: BTreeMap<(String, String), usize> = BTreeMap::new();
            for record in &records {
                *by_program
                    .entry((record.program_code.clone(), record.program_name.clone()))
                    .or_insert(0) += 1;
            }
            println!("\nSummary by program:");
            for ((code, name), count) in &by_program {
                println!("  {} - {}: {} students", code, name, count);
            }

            let out_path = config.clean_file(year);
            let file = report::bom_file(&out_path)?;
            report::write_clean_records(&records, file)?;
            println!("✅ Clean file saved: {}", out_path.display());
        }

        all_records.extend(records);
    }

    if all_records.is_empty() {
        println!("\n❌ No records processed");
        return Ok(());
    }

    println!();
    banner("GENERATING CONSOLIDATED FILE");

    let consolidated_path = Path::new(&config.clean_dir).join("Todos-los-años-consolidado.csv");
    let file = report::bom_file(&consolidated_path)?;
    report::write_clean_records(&all_records, file)?;
    println!(
        "\n✅ Consolidated file saved: {} ({} records)",
        consolidated_path.display(),
        all_records.len()
    );

    println!();
    banner("GENERAL SUMMARY");

    let mut by_year: BTreeMap<u16, usize> = BTreeMap::new();
    let mut by_program: BTreeMap<(String, String), usize> = BTreeMap::new();
    for record in &all_records {
        *by_year.entry(record.year).or_insert(0) += 1;
        *by_program
            .entry((record.program_code.clone(), record.program_name.clone()))
            .or_insert(0) += 1;
    }

    println!("\nStudents per year:");
    for (year, count) in &by_year {
        println!("  {}: {} students", year, count);
    }

    let mut programs: Vec<(&(String, String), &usize)> = by_program.iter().collect();
    programs.sort_by(|a, b| b.1.cmp(a.1));
    println!("\nTotal distinct programs: {}", programs.len());
    println!("\nTop 10 programs by enrollment (all years):");
    for ((code, name), count) in programs.iter().take(10) {
        println!("  {} - {}: {} students", code, name, count);
    }

    println!("\nClean files saved in: {}", config.clean_dir);
    Ok(())
}

fn load_alumni_index(config: &Config) -> Result<AlumniIndex> {
    println!("\n📚 Loading historical alumni database...");
    let path = Path::new(&config.alumni_database);
    let table = loader::load_with_headers(path, b';', &[])?;
    let index = AlumniIndex::from_table(&table)?;
    println!("✓ Historical alumni identified: {}", index.len());
    Ok(index)
}

fn run_alumni(config: &Config) -> Result<()> {
    banner("🎓 ALUMNI ANALYSIS OF POSTGRADUATE ENROLLMENT");

    let index = load_alumni_index(config)?;
    if index.is_empty() {
        println!("❌ No alumni records found in the database");
        return Ok(());
    }

    let mut students: Vec<MatchedStudent> = Vec::new();

    for year in config.years() {
        let path = config.posgrado_file(year);
        if !path.exists() {
            println!("⚠️  File not found: {}", path.display());
            continue;
        }

        println!("\n📄 Processing file: {}", path.display());

        let table = match loader::load_table(&path, b';') {
            Ok(table) => table,
            Err(error) => {
                println!("❌ Error reading {}: {}", path.display(), error);
                continue;
            }
        };

        let records = analyzer::dedup_by_cedula_program(extract::scan_posgrado_table(&table, year));

        let mut alumni_in_file = 0usize;
        let mut year_students = Vec::with_capacity(records.len());
        for record in records {
            let is_alumnus = index.contains(&record.cedula);
            if is_alumnus {
                alumni_in_file += 1;
            }
            year_students.push(MatchedStudent {
                year: record.year,
                program_code: if record.program_code.is_empty() {
                    "Sin_Codigo".to_string()
                } else {
                    record.program_code
                },
                program_name: if record.program_name.is_empty() {
                    "Sin_Programa".to_string()
                } else {
                    record.program_name
                },
                student_name: record.student_name,
                cedula: record.cedula,
                is_alumnus,
                prior_degrees: Vec::new(),
            });
        }

        println!("  ✓ Students processed: {}", year_students.len());
        if !year_students.is_empty() {
            println!(
                "  ✓ Alumni identified: {} ({:.1}%)",
                alumni_in_file,
                analyzer::percentage(alumni_in_file, year_students.len())
            );
        }

        students.extend(year_students);
    }

    if students.is_empty() {
        println!("\n❌ No data processed");
        return Ok(());
    }

    write_match_reports(config, &students, false)?;
    print_match_summary(&students);

    println!("\n✅ Analysis completed successfully");
    Ok(())
}

fn run_prior_degrees(config: &Config) -> Result<()> {
    banner("ANALYSIS OF PRIOR DEGREES IN POSTGRADUATE ENROLLMENT");
    println!("Identifying students with earlier degrees from other programs");

    let index = load_alumni_index(config)?;
    if index.is_empty() {
        println!("❌ No alumni records found in the database");
        return Ok(());
    }
    if index.degree_count() == 0 {
        println!("❌ The alumni database carries no degree titles, nothing to compare");
        return Ok(());
    }
    println!(
        "✓ Alumni with multiple degrees: {}",
        index.multi_degree_count()
    );

    let mut students: Vec<MatchedStudent> = Vec::new();

    for year in config.years() {
        let path = config.clean_file(year);
        if !path.exists() {
            println!("⚠️  File not found: {} (run the clean command first)", path.display());
            continue;
        }

        println!();
        banner(&format!("Processing: {}", path.display()));

        let table = match loader::load_with_headers(&path, b';', &[]) {
            Ok(table) => table,
            Err(error) => {
                println!("❌ Error reading {}: {}", path.display(), error);
                continue;
            }
        };

        let year_col = table.find_column(|h| h == "Año");
        let code_col = table.find_column(|h| h == "Codigo_Programa");
        let name_col = table.find_column(|h| h == "Nombre_Programa");
        let student_col = table.find_column(|h| h == "Nombre_Estudiante");
        let cedula_col = table.find_column(|h| h == "Cedula");

        let mut with_prior = 0usize;
        let mut processed = 0usize;
        for row in &table.rows {
            let cedula = table.value(row, cedula_col).trim().to_string();
            if cedula.is_empty() {
                continue;
            }
            let enrollment_year: u16 = table
                .value(row, year_col)
                .trim()
                .parse()
                .unwrap_or(year);
            let program_code = table.value(row, code_col).trim().to_string();
            let program_name = table.value(row, name_col).trim().to_string();

            let prior =
                index.prior_degrees(&cedula, enrollment_year, &program_code, &program_name);
            if !prior.is_empty() {
                with_prior += 1;
            }
            processed += 1;

            students.push(MatchedStudent {
                year: enrollment_year,
                program_code,
                program_name,
                student_name: table.value(row, student_col).trim().to_string(),
                cedula,
                is_alumnus: !prior.is_empty(),
                prior_degrees: prior,
            });
        }

        println!("Total students processed: {}", processed);
        println!("Alumni of other programs (with an earlier degree): {}", with_prior);
    }

    if students.is_empty() {
        println!("\n❌ No records processed");
        return Ok(());
    }

    write_match_reports(config, &students, true)?;
    print_match_summary(&students);

    let total = students.len();
    let with_prior = students.iter().filter(|s| s.is_alumnus).count();
    println!();
    banner("PROCESS COMPLETED SUCCESSFULLY");
    println!(
        "\nTotal students analyzed: {}\nWith a prior degree from another program: {} ({:.2}%)\nWithout a prior degree: {} ({:.2}%)",
        total,
        with_prior,
        analyzer::percentage(with_prior, total),
        total - with_prior,
        analyzer::percentage(total - with_prior, total)
    );
    Ok(())
}

/// The shared report family of the alumni and prior-degrees pipelines.
fn write_match_reports(
    config: &Config,
    students: &[MatchedStudent],
    include_prior: bool,
) -> Result<()> {
    println!("\n📊 Generating reports...");

    let out_dir = Path::new(&config.output_dir).join("egresados-posgrados");
    clean_match_outputs(&out_dir, config)?;

    // 1. Full detail of every student
    let complete_path = out_dir.join("estudiantes_posgrados_completo.csv");
    report::write_matched_detail(students, include_prior, report::bom_file(&complete_path)?)?;
    println!("✓ Complete file saved: {}", complete_path.display());

    // 2. Per-year summaries by program code
    let by_program = analyzer::summarize_by_program(students);
    let years: BTreeSet<u16> = students.iter().map(|s| s.year).collect();
    let mut per_year = Vec::new();
    for year in years {
        let rows: Vec<analyzer::ProgramSummaryRow> = by_program
            .iter()
            .filter(|row| row.year == year)
            .cloned()
            .collect();
        let path = out_dir.join(format!("egresados_posgrados_{}.csv", year));
        report::write_program_summary(&rows, include_prior, report::bom_file(&path)?)?;
        println!("✓ File {} saved: {}", year, path.display());
        per_year.push((year, rows));
    }

    // 3. Consolidated table across all years
    let consolidated_path = out_dir.join("consolidado_todos_los_años.csv");
    report::write_consolidated(&by_program, include_prior, report::bom_file(&consolidated_path)?)?;
    println!("✓ Consolidated file saved: {}", consolidated_path.display());

    // 4. Totals per year
    let by_year = analyzer::summarize_by_year(students);
    let summary_path = out_dir.join("resumen_general_por_año.csv");
    report::write_year_summary(&by_year, include_prior, report::bom_file(&summary_path)?)?;
    println!("✓ General summary saved: {}", summary_path.display());

    // 5. Excel workbook, one sheet per year
    let xlsx_path = out_dir.join("egresados_posgrados_por_año.xlsx");
    let sheet_prefix = if include_prior { "Año " } else { "" };
    let consolidated = if include_prior {
        Some(&by_program[..])
    } else {
        None
    };
    report::xlsx_matched_workbook(
        &xlsx_path,
        &by_year,
        &per_year,
        consolidated,
        include_prior,
        sheet_prefix,
    )?;
    println!("✓ Excel workbook saved: {}", xlsx_path.display());

    Ok(())
}

/// Remove the previous run's report files, teacher-style: only the known
/// file names, nothing else in the directory.
fn clean_match_outputs(out_dir: &Path, config: &Config) -> Result<()> {
    if !out_dir.exists() {
        return Ok(());
    }

    println!("🧹 Cleaning previous results...");

    let mut items = vec![
        "estudiantes_posgrados_completo.csv".to_string(),
        "consolidado_todos_los_años.csv".to_string(),
        "resumen_general_por_año.csv".to_string(),
        "egresados_posgrados_por_año.xlsx".to_string(),
    ];
    for year in config.years() {
        items.push(format!("egresados_posgrados_{}.csv", year));
    }

    for item in &items {
        let item_path = out_dir.join(item);
        if item_path.is_file() {
            fs::remove_file(&item_path)?;
            println!("   🗑️  Removed file: {}", item);
        }
    }

    Ok(())
}

fn print_match_summary(students: &[MatchedStudent]) {
    println!();
    banner("📈 SUMMARY BY YEAR AND PROGRAM");

    let by_program = analyzer::summarize_by_program(students);
    let by_year = analyzer::summarize_by_year(students);

    for year_row in &by_year {
        println!("\n{}", "=".repeat(80));
        println!("📅 YEAR {}", year_row.year);
        println!("{}", "=".repeat(80));
        println!(
            "Total students: {} | Alumni: {} ({:.1}%)",
            year_row.total,
            year_row.alumni,
            year_row.pct()
        );
        println!(
            "\n{:<60} {:>8} {:>9} {:>6}",
            "Program", "Total", "Alumni", "%"
        );
        println!("{}", "-".repeat(80));

        for row in by_program.iter().filter(|row| row.year == year_row.year) {
            println!(
                "{:<60} {:>8} {:>9} {:>5.1}%",
                truncate(&row.name, 55),
                row.total,
                row.alumni,
                row.pct()
            );
        }
    }
}

fn run_leadership(config: &Config) -> Result<()> {
    banner("LEADERSHIP POSITIONS ANALYSIS - ALUMNI SURVEYS");

    let mut records: Vec<LeadershipRecord> = Vec::new();

    for file_name in &config.survey_files {
        let path = config.survey_file(file_name);
        if !path.exists() {
            println!("⚠️  File not found: {}", path.display());
            continue;
        }

        println!("\n📊 Processing: {}", file_name);
        println!("{}", "-".repeat(80));

        let table = match loader::load_with_headers(&path, b';', &["DOCUMENTO", "NOMBRES"]) {
            Ok(table) => table,
            Err(error) => {
                println!("❌ Error processing {}: {}", file_name, error);
                continue;
            }
        };

        let cols = SurveyColumns::resolve(&table);
        let role_col = match cols.role {
            Some(col) => col,
            None => {
                println!("❌ Could not identify the job-title column");
                continue;
            }
        };
        println!("✓ Job-title column found: '{}'", table.headers[role_col]);

        let total_with_role = table
            .rows
            .iter()
            .filter(|row| !table.value(row, Some(role_col)).trim().is_empty())
            .count();
        println!("✓ Valid records with a job title: {}", total_with_role);

        let file_start = records.len();
        for row in &table.rows {
            let role = table.value(row, Some(role_col)).trim();
            if role.is_empty() {
                continue;
            }
            if !extract::is_leadership_role(role, &config.leadership_keywords) {
                continue;
            }

            let full_name = format!(
                "{} {}",
                table.value(row, cols.names).trim(),
                table.value(row, cols.surnames).trim()
            )
            .trim()
            .to_string();

            records.push(LeadershipRecord {
                file: file_name.clone(),
                name: full_name,
                role: role.to_string(),
                program: or_na(table.value(row, cols.program)),
                company: or_na(table.value(row, cols.company)),
            });
        }

        let found = records.len() - file_start;
        println!("✓ Leadership positions identified: {}", found);
        println!(
            "✓ Percentage: {:.2}%",
            analyzer::percentage(found, total_with_role)
        );

        if found > 0 {
            println!("\n📋 Examples of positions found:");
            for (i, record) in records[file_start..].iter().take(5).enumerate() {
                println!("   {}. {}", i + 1, record.role);
            }
            if found > 5 {
                println!("   ... and {} more", found - 5);
            }
        }
    }

    println!();
    banner("GENERAL SUMMARY");

    if records.is_empty() {
        println!("\n⚠️  No leadership positions found in the analyzed files.");
        return Ok(());
    }

    println!("\n📈 Total leadership positions identified: {}", records.len());

    println!("\n📊 Distribution by position type:");
    println!("{}", "-".repeat(80));
    for (keyword, count) in analyzer::leadership_distribution(&records, &config.leadership_keywords)
    {
        println!("   {:<20}: {:>3} people", keyword, count);
    }

    let out_dir = Path::new(&config.output_dir).join("cargos-directivos");
    let csv_path = out_dir.join("cargos_directivos_analisis.csv");
    report::write_leadership_csv(&records, report::bom_file(&csv_path)?)?;
    let xlsx_path = out_dir.join("cargos_directivos_analisis.xlsx");
    report::xlsx_leadership_workbook(&xlsx_path, &records)?;

    println!("\n💾 Results saved successfully:");
    println!("   📄 CSV: {}", csv_path.display());
    println!("   📗 Excel: {}", xlsx_path.display());

    println!("\n📋 FULL LEADERSHIP LISTING:");
    println!("{}", "-".repeat(80));
    println!("{:<5} {:<30} {:<35}", "No.", "Name", "Position");
    println!("{}", "-".repeat(80));
    for (i, record) in records.iter().enumerate() {
        println!(
            "{:<5} {:<30} {:<35}",
            i + 1,
            truncate(&record.name, 28),
            truncate(&record.role, 33)
        );
    }

    println!();
    banner("Analysis completed successfully");
    Ok(())
}

fn run_programs(config: &Config) -> Result<()> {
    banner("LEADERSHIP POSITIONS BY PROGRAM AND GRADUATION YEAR");

    let csv_path = Path::new(&config.output_dir)
        .join("cargos-directivos")
        .join("cargos_directivos_analisis.csv");
    if !csv_path.exists() {
        println!("❌ File not found: {}", csv_path.display());
        println!("   Run the leadership command first to generate it.");
        return Ok(());
    }

    println!("📊 Processing file: {}", csv_path.display());
    println!("{}", "-".repeat(80));

    let table = loader::load_with_headers(&csv_path, b',', &[])?;
    println!("✓ Total leadership records in file: {}", table.rows.len());

    let program_col = match table.find_column(|h| h == "Programa") {
        Some(col) => col,
        None => {
            println!("❌ The 'Programa' column is missing from the file");
            return Ok(());
        }
    };
    let file_col = table.find_column(|h| h == "Archivo");
    let name_col = table.find_column(|h| h == "Nombre");
    let role_col = table.find_column(|h| h == "Cargo");
    let company_col = table.find_column(|h| h == "Empresa");

    let mut collected: Vec<SurveyGraduate> = Vec::new();
    for row in &table.rows {
        let program_cell = table.value(row, Some(program_col));
        for entry in extract::parse_program_entries(program_cell, config.first_year, config.last_year)
        {
            let kind = ProgramKind::classify(&entry.name, "");
            collected.push(SurveyGraduate {
                file: or_na(table.value(row, file_col)),
                documento: String::new(),
                name: table.value(row, name_col).trim().to_string(),
                role: table.value(row, role_col).trim().to_string(),
                company: or_na(table.value(row, company_col)),
                occupation: String::new(),
                program: entry.name,
                kind,
                grad_year: entry.year,
                grad_date: entry.date,
                survey_date: None,
            });
        }
    }

    let graduates = analyzer::dedup_graduates_first(collected);
    println!("✓ Unique records processed (duplicates dropped): {}", graduates.len());

    println!();
    banner("ANALYSIS RESULTS");

    if graduates.is_empty() {
        println!("\n⚠️  No leadership positions with valid graduation programs found.");
        return Ok(());
    }

    println!("\n📈 Total leadership positions identified: {}", graduates.len());
    let stats = analyzer::survey_stats(&graduates, config.years());
    print_survey_stats(&stats, "people");

    println!("\n💾 Saving results...");
    let out_dir = Path::new(&config.output_dir).join("cargos-directivos");

    let detail_csv = out_dir.join("cargos_directivos_por_programa_año.csv");
    report::write_graduates_csv(
        &graduates,
        SurveyDetail::Leadership,
        report::bom_file(&detail_csv)?,
    )?;
    println!("   📄 Detailed CSV: {}", detail_csv.display());

    let workbook_path = out_dir.join("cargos_directivos_por_programa_año.xlsx");
    report::xlsx_survey_workbook(&workbook_path, &graduates, &stats, SurveyDetail::Leadership)?;
    println!("   📗 Excel workbook: {}", workbook_path.display());

    println!("\n📁 Generating per-year files...");
    for (year, count) in &stats.by_year {
        if *count == 0 {
            continue;
        }
        let year_rows: Vec<SurveyGraduate> = graduates
            .iter()
            .filter(|g| g.grad_year == *year)
            .cloned()
            .collect();
        let year_path = out_dir.join(format!("cargos_directivos_{}.xlsx", year));
        report::xlsx_graduates_workbook(&year_path, &year_rows, SurveyDetail::Leadership)?;
        println!("   ✓ {}: {} records → {}", year, count, year_path.display());
    }

    println!();
    banner("Analysis completed successfully");
    Ok(())
}

fn run_graduates(config: &Config) -> Result<()> {
    banner("ALL GRADUATES BY PROGRAM AND GRADUATION YEAR");

    let mut collected: Vec<SurveyGraduate> = Vec::new();

    for file_name in &config.survey_files {
        let path = config.survey_file(file_name);
        if !path.exists() {
            println!("⚠️  File not found: {}", path.display());
            continue;
        }

        println!("\n📊 Processing: {}", file_name);
        println!("{}", "-".repeat(80));

        let table = match loader::load_with_headers(&path, b';', &["DOCUMENTO", "NOMBRES"]) {
            Ok(table) => table,
            Err(error) => {
                println!("❌ Error processing {}: {}", file_name, error);
                continue;
            }
        };
        println!("✓ Total records in file: {}", table.rows.len());

        let cols = SurveyColumns::resolve(&table);
        let program_col = match cols.program {
            Some(col) => col,
            None => {
                println!("❌ The PROGRAMA(S) column was not found");
                continue;
            }
        };
        println!("✓ Program column found: '{}'", table.headers[program_col]);

        let file_start = collected.len();
        for row in &table.rows {
            let documento = table.value(row, cols.documento).trim().to_string();
            let mut full_name = format!(
                "{} {}",
                table.value(row, cols.names).trim(),
                table.value(row, cols.surnames).trim()
            )
            .trim()
            .to_string();
            if full_name.is_empty() && !documento.is_empty() {
                full_name = format!("Doc_{}", documento);
            }

            let survey_date =
                extract::parse_survey_date(table.value(row, cols.survey_date));
            let occupation = table.value(row, cols.occupation).trim().to_string();
            let role = table.value(row, cols.role).trim().to_string();

            let program_cell = table.value(row, Some(program_col));
            for entry in
                extract::parse_program_entries(program_cell, config.first_year, config.last_year)
            {
                let kind = ProgramKind::classify(&entry.name, "");
                collected.push(SurveyGraduate {
                    file: file_name.clone(),
                    documento: documento.clone(),
                    name: full_name.clone(),
                    role: role.clone(),
                    company: String::new(),
                    occupation: occupation.clone(),
                    program: entry.name,
                    kind,
                    grad_year: entry.year,
                    grad_date: entry.date,
                    survey_date,
                });
            }
        }

        println!(
            "✓ Graduation records collected from this file: {}",
            collected.len() - file_start
        );
    }

    let graduates = analyzer::dedup_graduates_keep_latest(collected);

    println!();
    banner("ANALYSIS RESULTS");

    if graduates.is_empty() {
        println!("\n⚠️  No graduates found to analyze");
        println!("   Check that the CSV files contain valid data");
        return Ok(());
    }

    println!("\n📈 Total unique graduates identified: {}", graduates.len());
    let stats = analyzer::survey_stats(&graduates, config.years());
    print_survey_stats(&stats, "graduates");

    println!();
    banner("EXPORTING RESULTS");

    let out_dir = Path::new(&config.output_dir).join("todos-egresados");

    let csv_path = out_dir.join("todos_egresados_por_programa_año.csv");
    report::write_graduates_csv(
        &graduates,
        SurveyDetail::Graduates,
        report::bom_file(&csv_path)?,
    )?;
    println!("✓ CSV file exported: {}", csv_path.display());

    let workbook_path = out_dir.join("todos_egresados_por_programa_año.xlsx");
    report::xlsx_survey_workbook(&workbook_path, &graduates, &stats, SurveyDetail::Graduates)?;
    println!("✓ Excel file exported: {}", workbook_path.display());
    println!("  - Sheet 1: Datos Completos ({} records)", graduates.len());
    println!("  - Sheet 2: Por Año ({} years)", stats.by_year.len());
    println!("  - Sheet 3: Por Programa ({} programs)", stats.by_program.len());
    println!(
        "  - Sheet 4: Año x Programa ({} combinations)",
        stats.by_year_program.len()
    );

    println!("\n📁 Generating per-year files...");
    for (year, count) in &stats.by_year {
        if *count == 0 {
            continue;
        }
        let year_rows: Vec<SurveyGraduate> = graduates
            .iter()
            .filter(|g| g.grad_year == *year)
            .cloned()
            .collect();
        let year_path = out_dir.join(format!("todos_egresados_{}.xlsx", year));
        report::xlsx_graduates_workbook(&year_path, &year_rows, SurveyDetail::Graduates)?;
        println!("   ✓ {}: {} graduates → {}", year, count, year_path.display());
    }

    println!();
    banner("PROCESS COMPLETED SUCCESSFULLY");
    println!("\n📊 Final summary:");
    println!("   - Total unique graduates: {}", graduates.len());
    println!("   - Years analyzed: {}-{}", config.first_year, config.last_year);
    println!("   - Distinct programs: {}", stats.by_program.len());
    Ok(())
}

fn print_survey_stats(stats: &analyzer::SurveyStats, noun: &str) {
    println!("\n📅 DISTRIBUTION BY GRADUATION YEAR:");
    println!("{}", "-".repeat(80));
    for (year, count) in &stats.by_year {
        println!(
            "   {}: {:>4} {} ({:>5.2}%)",
            year,
            count,
            noun,
            analyzer::percentage(*count, stats.total)
        );
    }

    println!("\n🎓 DISTRIBUTION BY PROGRAM (Top 20):");
    println!("{}", "-".repeat(80));
    for (i, (program, count)) in stats.by_program.iter().take(20).enumerate() {
        println!(
            "   {:>2}. {:<53}: {:>4} ({:>5.2}%)",
            i + 1,
            truncate(program, 50),
            count,
            analyzer::percentage(*count, stats.total)
        );
    }
    if stats.by_program.len() > 20 {
        println!("   ... and {} more programs", stats.by_program.len() - 20);
    }

    println!("\n📊 DISTRIBUTION BY YEAR AND PROGRAM (Top 30 combinations):");
    println!("{}", "-".repeat(80));
    println!(
        "{:<6} {:<15} {:<45} {:>10}",
        "Year", "Type", "Program", "Count"
    );
    println!("{}", "-".repeat(80));
    for combo in stats.by_year_program.iter().take(30) {
        println!(
            "{:<6} {:<15} {:<45} {:>10}",
            combo.year,
            combo.kind.label(),
            truncate(&combo.program, 43),
            combo.count
        );
    }
    if stats.by_year_program.len() > 30 {
        println!(
            "\n   ... and {} more combinations",
            stats.by_year_program.len() - 30
        );
    }
}

fn run_values(config: &Config) -> Result<()> {
    banner("DISTINCT OCCUPATIONAL-INFORMATION VALUES");

    let mut all_values: BTreeSet<String> = BTreeSet::new();

    for file_name in &config.survey_files {
        let path = config.survey_file(file_name);
        if !path.exists() {
            println!("⚠️  File not found: {}", path.display());
            continue;
        }

        let table = match loader::load_with_headers(&path, b';', &["DOCUMENTO", "NOMBRES"]) {
            Ok(table) => table,
            Err(error) => {
                println!("❌ Error processing {}: {}", file_name, error);
                continue;
            }
        };

        println!("\n{}", "=".repeat(80));
        println!("File: {}", file_name);
        println!("{}", "=".repeat(80));

        for (idx, header) in table.headers.iter().enumerate() {
            let upper = header.to_uppercase();
            if !(upper.contains("INFORMACI") && upper.contains("OCUPACIONAL")) {
                continue;
            }

            println!("\nColumn found: '{}'", header);
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for row in &table.rows {
                let value = table.value(row, Some(idx)).trim();
                if value.is_empty() {
                    continue;
                }
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }

            println!("Unique values ({}):", counts.len());
            for (value, count) in &counts {
                println!("  - {}: {} records", value, count);
                all_values.insert(value.clone());
            }
        }
    }

    println!();
    banner("ALL UNIQUE VALUES FOUND:");
    for value in &all_values {
        println!("  - {}", value);
    }
    Ok(())
}
