use anyhow::{Context, Result, bail};
use gridview_core::{LeafPatch, apply_view, to_query_pairs};
use gridview_model::{FieldRegistry, FieldType, FilterValue};
use gridview_sync::{ConfiguredBackend, PreferenceSync, ResourceView};
use tracing::{info, info_span, warn};

use gridview_cli::render::{columns_table, render_tree, rows_table};
use gridview_cli::screen::{RowFormat, Screen, load_rows};

use crate::cli::{
    ColumnsArgs, FilterAction, FilterArgs, RowFormatArg, ScreenArgs, ShowArgs, SortArgs,
};

type Session = PreferenceSync<ConfiguredBackend>;
type View = ResourceView<ConfiguredBackend>;

/// Load the screen file and open its hydrated view.
async fn open(sync: &Session, args: &ScreenArgs) -> Result<(Screen, View)> {
    let screen = Screen::load(&args.screen)?;
    let mut view = sync.open(
        screen.resource.clone(),
        screen.defaults.clone(),
        screen.fields.clone(),
    );
    let hydration = view.load().await;
    info!(resource = %screen.resource, ?hydration, "view loaded");
    Ok((screen, view))
}

/// Persist the view now; a failed write is reported but does not fail the
/// command.
async fn persist(view: &mut View) {
    if let Err(error) = view.flush().await {
        warn!(resource = view.resource(), %error, "view state not saved");
        eprintln!("warning: {}", error.user_message());
    }
}

pub async fn run_show(sync: &Session, args: &ShowArgs) -> Result<()> {
    let (screen, view) = open(sync, &args.screen).await?;
    let span = info_span!("show", resource = %screen.resource);
    let _guard = span.enter();

    let format = match args.format {
        Some(RowFormatArg::Json) => RowFormat::Json,
        Some(RowFormatArg::Csv) => RowFormat::Csv,
        None => RowFormat::from_path(&args.rows),
    };
    let rows = load_rows(&args.rows, format)?;
    let mut shown = apply_view(view.state(), &rows, &screen.fields);
    let matched = shown.len();
    if let Some(limit) = args.limit {
        shown.truncate(limit);
    }

    println!("{}", rows_table(view.state(), &shown, &screen.fields));
    println!("{} of {} rows (matched {})", shown.len(), rows.len(), matched);
    Ok(())
}

pub async fn run_view(sync: &Session, args: &ScreenArgs) -> Result<()> {
    let (_, view) = open(sync, args).await?;
    let json = serde_json::to_string_pretty(view.state()).context("serialize view state")?;
    println!("{json}");
    Ok(())
}

pub async fn run_query(sync: &Session, args: &ScreenArgs) -> Result<()> {
    let (_, view) = open(sync, args).await?;
    for (key, value) in to_query_pairs(view.state()) {
        println!("{key}={value}");
    }
    Ok(())
}

pub async fn run_sort(sync: &Session, args: &SortArgs) -> Result<()> {
    let (screen, mut view) = open(sync, &args.screen).await?;
    let changed = match args.direction {
        Some(direction) => view.set_sort(Some(args.column.clone()), direction.into()),
        None => view.toggle_sort(&args.column),
    };
    report(changed, "sort");
    persist(&mut view).await;
    println!("{}", columns_table(view.state(), &screen.fields));
    Ok(())
}

pub async fn run_columns(sync: &Session, args: &ColumnsArgs) -> Result<()> {
    let (screen, mut view) = open(sync, &args.screen).await?;
    let mut changed = false;

    if let Some(order) = &args.order {
        let known = &view.state().columns_order;
        if let Some(unknown) = order.iter().find(|column| !known.contains(column)) {
            bail!("unknown column '{unknown}' in --order");
        }
        changed |= view.set_columns_order(order.clone());
    }
    for column in &args.show {
        changed |= view.set_column_visible(column, true);
    }
    for column in &args.hide {
        changed |= view.set_column_visible(column, false);
    }
    for column in &args.toggle {
        changed |= view.toggle_column(column);
    }

    report(changed, "columns");
    persist(&mut view).await;
    println!("{}", columns_table(view.state(), &screen.fields));
    Ok(())
}

pub async fn run_filter(sync: &Session, args: &FilterArgs) -> Result<()> {
    let (screen, mut view) = open(sync, &args.screen).await?;
    let root = view.state().filters_tree.id.clone();
    let or_root = |id: &Option<String>| id.clone().unwrap_or_else(|| root.to_string());

    let changed = match &args.action {
        FilterAction::AddLeaf { field, parent } => {
            if screen.fields.get(field).is_none() {
                bail!("field '{field}' is not filterable on {}", screen.resource);
            }
            view.add_leaf(&or_root(parent), field)
        }
        FilterAction::AddGroup { logical, parent } => {
            view.add_group(&or_root(parent), (*logical).into())
        }
        FilterAction::Remove { id } => view.remove_node(id),
        FilterAction::Set {
            id,
            field,
            operator,
            value,
        } => {
            let patch = leaf_patch(&view, &screen.fields, id, field, operator, value);
            if patch.is_empty() {
                bail!("nothing to change: pass --field, --operator or --value");
            }
            view.update_leaf(id, &patch)
        }
        FilterAction::Logical { logical, group } => {
            view.set_logical(&or_root(group), (*logical).into())
        }
        FilterAction::Clear => view.clear_filters(),
    };

    report(changed, "filter");
    persist(&mut view).await;
    print!("{}", render_tree(&view.state().filters_tree));
    Ok(())
}

fn leaf_patch(
    view: &View,
    registry: &FieldRegistry,
    id: &str,
    field: &Option<String>,
    operator: &Option<String>,
    value: &Option<String>,
) -> LeafPatch {
    // A value is typed after the field it will belong to.
    let target_field = field.clone().or_else(|| {
        view.state()
            .filters_tree
            .find_leaf(id)
            .map(|leaf| leaf.field.clone())
    });
    let field_type = target_field
        .as_deref()
        .map_or(FieldType::String, |name| registry.field_type(name));
    LeafPatch {
        field: field.clone(),
        operator: operator.clone(),
        value: value.as_deref().map(|raw| parse_value(raw, field_type)),
    }
}

/// Interpret a command-line value for a field of `field_type`.
pub(crate) fn parse_value(raw: &str, field_type: FieldType) -> FilterValue {
    if raw.trim() == "null" {
        return FilterValue::Null;
    }
    match field_type {
        FieldType::String | FieldType::Date => FilterValue::Text(raw.to_string()),
        FieldType::Number | FieldType::Boolean => FilterValue::parse_loose(raw),
    }
}

fn report(changed: bool, what: &str) {
    if changed {
        info!(what, "view state changed");
    } else {
        eprintln!("note: {what} unchanged");
    }
}
