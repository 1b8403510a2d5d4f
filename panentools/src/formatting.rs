use groupbuy_engine::db_types::{Product, Store};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

pub fn format_store(store: &Store) -> String {
    let mut table = Table::new();
    table.set_format(markdown_format());
    table.set_titles(row!["ID", "Name", "Owner", "Created At"]);
    table.add_row(row![store.id, store.store_name, store.owner_id, store.created_at.to_string()]);
    table.to_string()
}

pub fn format_product(product: &Product) -> String {
    let mut table = Table::new();
    table.set_format(markdown_format());
    table.set_titles(row!["ID", "Store", "Title", "Price", "Created At"]);
    table.add_row(row![product.id, product.store_id, product.title, product.price, product.created_at.to_string()]);
    table.to_string()
}
