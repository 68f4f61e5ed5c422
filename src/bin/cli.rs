#![cfg(not(tarpaulin_include))]

use obligation_grid::downloader::to_csv;
use obligation_grid::filter::{FilterCriterion, FilterOperator};
use obligation_grid::grid::{ColumnHeader, GridState, ViewSnapshot};
use obligation_grid::interaction::CriteriaList;
use obligation_grid::layout::ViewMode;
use obligation_grid::model::Field;
use obligation_grid::saving;
use obligation_grid::session::MemoryStore;
use obligation_grid::sort::{SortCriterion, SortDirection};

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

type CommandResult = Result<String, Box<dyn Error>>;

/// Sidebar state: criteria being assembled before they are applied.
#[derive(Default)]
struct Sidebar {
    filters: CriteriaList<FilterCriterion>,
    sorts: CriteriaList<SortCriterion>,
}

fn cell_width(size: u32) -> usize {
    ((size / 8) as usize).clamp(4, 24)
}

fn fit(value: &str, width: usize) -> String {
    let clipped: String = value.chars().take(width).collect();
    format!("{:<width$}", clipped, width = width)
}

fn header_label(column: &ColumnHeader) -> String {
    let arrow = match column.sort {
        Some(SortDirection::Asc) => " ^",
        Some(SortDirection::Desc) => " v",
        None => "",
    };
    format!("{}{}", column.header, arrow)
}

fn print_header(columns: &[ColumnHeader], lead: &str) {
    print!("{}", lead);
    for column in columns {
        print!("{} ", fit(&header_label(column), cell_width(column.size)));
    }
    println!();
}

fn display(grid: &GridState) {
    println!("== {} ==", grid.mode().label());
    match grid.view() {
        ViewSnapshot::Grouped(view) => {
            print_header(&view.columns, "  ");
            for row in &view.rows {
                print!("{} ", if row.expanded { "-" } else { "+" });
                for (column, cell) in view.columns.iter().zip(&row.cells) {
                    print!("{} ", fit(cell, cell_width(column.size)));
                }
                println!();
                if !row.expanded {
                    continue;
                }
                for task in &row.tasks {
                    println!(
                        "    {} {} ({} obligations)",
                        if task.expanded { "-" } else { "+" },
                        task.task_id,
                        task.obligations.len()
                    );
                    if task.expanded {
                        for obligation in &task.obligations {
                            println!(
                                "        {} | {} | triggered {} | open {} | {}",
                                obligation.title,
                                obligation.criticality.as_str(),
                                obligation.triggered_tasks,
                                obligation.open_tasks,
                                obligation.compliance.as_str()
                            );
                        }
                    }
                }
            }
        }
        ViewSnapshot::Flat(view) => {
            print_header(&view.columns, "  #  ");
            for row in &view.rows {
                print!("{:>3}  ", row.index);
                for (column, cell) in view.columns.iter().zip(&row.cells) {
                    print!("{} ", fit(cell, cell_width(column.size)));
                }
                println!();
            }
        }
        ViewSnapshot::Transposed(view) => {
            for row in &view.rows {
                let arrow = match row.sort {
                    Some(SortDirection::Asc) => " ^",
                    Some(SortDirection::Desc) => " v",
                    None => "",
                };
                print!("{} ", fit(&format!("{}{}", row.header, arrow), 18));
                for cell in &row.cells {
                    print!("{} ", fit(cell, 12));
                }
                println!();
            }
        }
    }
}

fn parse_field(raw: Option<&str>) -> Result<Field, Box<dyn Error>> {
    let raw = raw.ok_or("missing column")?;
    Ok(raw.parse::<Field>()?)
}

fn parse_index(raw: Option<&str>) -> Result<usize, Box<dyn Error>> {
    let raw = raw.ok_or("missing index")?;
    Ok(raw.parse::<usize>()?)
}

fn filter_command(grid: &mut GridState, sidebar: &mut Sidebar, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let field = parse_field(args.get(1).copied())?;
            let operator = args
                .get(2)
                .and_then(|op| FilterOperator::parse(op))
                .ok_or("unknown operator")?;
            let value = args.get(3).copied().unwrap_or_default();
            let criterion = match operator {
                FilterOperator::Range => {
                    let upper = args.get(4).ok_or("range needs two bounds")?;
                    FilterCriterion::range(field, value, *upper)
                }
                _ => FilterCriterion::new(field, operator, args[3.min(args.len())..].join(" ")),
            };
            sidebar.filters.add(criterion);
        }
        Some("rm") => {
            sidebar
                .filters
                .remove(parse_index(args.get(1).copied())?)
                .ok_or("no such filter")?;
        }
        Some("move") => {
            let from = parse_index(args.get(1).copied())?;
            let to = parse_index(args.get(2).copied())?;
            if !sidebar.filters.move_item(from, to) {
                return Err("no such filter".into());
            }
        }
        Some("list") => {
            for (i, criterion) in sidebar.filters.items().iter().enumerate() {
                println!(
                    "  {}: {} {} {}{}",
                    i,
                    criterion.field.header(),
                    criterion.operator.label(),
                    criterion.value,
                    criterion
                        .upper_value
                        .as_deref()
                        .map(|upper| format!(" .. {}", upper))
                        .unwrap_or_default()
                );
            }
        }
        Some("apply") => grid.apply_filters(sidebar.filters.items()),
        Some("clear") => {
            sidebar.filters.clear();
            grid.apply_filters(&[]);
        }
        _ => return Err("usage: filter add|rm|move|list|apply|clear".into()),
    }
    Ok(String::from("ok"))
}

fn sort_command(grid: &mut GridState, sidebar: &mut Sidebar, args: &[&str]) -> CommandResult {
    match args.first().copied() {
        Some("add") => {
            let field = parse_field(args.get(1).copied())?;
            let direction = match args.get(2) {
                Some(raw) => SortDirection::parse(raw).ok_or("direction must be asc or desc")?,
                None => SortDirection::Asc,
            };
            sidebar.sorts.add(SortCriterion { field, direction });
        }
        Some("rm") => {
            sidebar
                .sorts
                .remove(parse_index(args.get(1).copied())?)
                .ok_or("no such sort")?;
        }
        Some("move") => {
            let from = parse_index(args.get(1).copied())?;
            let to = parse_index(args.get(2).copied())?;
            if !sidebar.sorts.move_item(from, to) {
                return Err("no such sort".into());
            }
        }
        Some("list") => {
            for (i, criterion) in sidebar.sorts.items().iter().enumerate() {
                println!("  {}: {} {:?}", i, criterion.field.header(), criterion.direction);
            }
        }
        Some("apply") => grid.apply_sort(sidebar.sorts.items()),
        Some("clear") => {
            sidebar.sorts.clear();
            grid.apply_sort(&[]);
        }
        _ => return Err("usage: sort add|rm|move|list|apply|clear".into()),
    }
    Ok(String::from("ok"))
}

fn run_command(grid: &mut GridState, sidebar: &mut Sidebar, command: &str) -> CommandResult {
    let parts: Vec<&str> = command.split_whitespace().collect();
    let (name, args) = match parts.split_first() {
        Some((name, args)) => (*name, args),
        None => return Err("invalid command".into()),
    };

    match name {
        "view" => {
            let mode = args.first().ok_or("missing view")?.parse::<ViewMode>()?;
            grid.switch_view(mode);
        }
        "filter" => return filter_command(grid, sidebar, args),
        "sort" => return sort_command(grid, sidebar, args),
        "click" => {
            let direction = grid.toggle_sort(parse_field(args.first().copied())?)?;
            return Ok(format!("{:?}", direction));
        }
        "quick" => {
            let field = parse_field(args.first().copied())?;
            grid.set_column_filter(field, &args[1.min(args.len())..].join(" "))?;
        }
        "hide" | "show" => {
            grid.set_visibility(parse_field(args.first().copied())?, name == "show")?;
        }
        "move" => {
            grid.begin_drag(parse_field(args.first().copied())?)?;
            grid.drag_over(parse_field(args.get(1).copied())?)?;
            if !grid.end_drag()? {
                return Ok(String::from("unchanged"));
            }
        }
        "resize" => {
            let field = parse_field(args.first().copied())?;
            let delta: i32 = args.get(1).ok_or("missing delta")?.parse()?;
            grid.begin_resize(field, 0)?;
            grid.resize_to(delta);
            let size = grid.end_resize().ok_or("resize failed")?;
            return Ok(format!("{} px", size));
        }
        "expand" => {
            let id = args.first().ok_or("missing id")?;
            grid.toggle_expanded(id);
        }
        "edit" => {
            let row = parse_index(args.first().copied())?;
            let field = parse_field(args.get(1).copied())?;
            let value = args[2.min(args.len())..].join(" ");
            grid.edit_cell(row, field, value)?;
        }
        "remark" => {
            let row = parse_index(args.first().copied())?;
            grid.set_remarks(row, args[1.min(args.len())..].join(" "))?;
        }
        "export" => {
            let filename = args.first().ok_or("missing filename")?;
            fs::write(filename, to_csv(grid))?;
        }
        "save" => {
            let filename = args.first().ok_or("missing filename")?;
            saving::save_snapshot(grid, Path::new(filename))?;
        }
        "load" => {
            let filename = args.first().ok_or("missing filename")?;
            *grid = saving::load_snapshot(Path::new(filename))?.grid;
        }
        _ => return Err("invalid command".into()),
    }
    Ok(String::from("ok"))
}

fn print_help() {
    println!("Commands:");
    println!("  q: Quit");
    println!("  view <grouped|flat|transposed>: Switch view");
    println!("  filter add <column> <operator> <value> [upper]: Add a filter rule");
    println!("  filter rm|move|list|apply|clear: Manage filter rules");
    println!("  sort add <column> [asc|desc]: Add a sort rule");
    println!("  sort rm|move|list|apply|clear: Manage sort rules");
    println!("  click <column>: Cycle the header sort of a column");
    println!("  quick <column> [value]: Set or clear a column filter");
    println!("  hide|show <column>: Toggle column visibility");
    println!("  move <column> <target>: Drag a column onto another");
    println!("  resize <column> <delta>: Resize a column by delta pixels");
    println!("  expand <contract or task id>: Expand or collapse a grouped row");
    println!("  edit <row> <column> <value>: Edit a cell of the flat data");
    println!("  remark <row> <text>: Set remarks of a flat row");
    println!("  export <file.csv>: Export the flat view");
    println!("  save <file> / load <file>: Snapshot the session");
    println!("  disable_output / enable_output: Toggle table display");
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let s = Instant::now();

    // Optional seed for a reproducible dataset: grid-cli [seed]
    let args: Vec<String> = env::args().collect();
    let mut rng = match args.get(1) {
        Some(seed) => StdRng::seed_from_u64(seed.parse()?),
        None => StdRng::from_entropy(),
    };

    let mut store = MemoryStore::new();
    let mut grid = GridState::from_session(&mut store, &mut rng);
    let mut sidebar = Sidebar::default();

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    let mut show = true;
    loop {
        if show {
            display(&grid);
        }

        print!("[{:.1}] ({}) > ", start_time.elapsed().as_secs_f64(), status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        match command {
            "q" => break,
            "help" => {
                print_help();
                continue;
            }
            "disable_output" => {
                show = false;
                status = String::from("ok");
                continue;
            }
            "enable_output" => {
                show = true;
                status = String::from("ok");
                continue;
            }
            _ => {}
        }

        status = match run_command(&mut grid, &mut sidebar, command) {
            Ok(message) => message,
            Err(e) => e.to_string(),
        };
        if let Err(e) = grid.persist(&mut store) {
            status = e.to_string();
        }
    }

    println!("Total elapsed time: {:.1} seconds", s.elapsed().as_secs_f64());
    Ok(())
}
