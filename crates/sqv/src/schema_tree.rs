//! Schema objects arranged as the Structure view's tree.

use std::io;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use tui_tree_widget::TreeItem;

use crate::db::{Database, SchemaKind, SchemaObject};
use crate::error::QueryError;

/// Identity of a node in the schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// One of the four top-level groups.
    Branch(SchemaKind),
    Object { kind: SchemaKind, name: String },
    Column { table: String, column: String },
}

impl NodeId {
    /// Name of the object or column this node stands for.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeId::Branch(_) => None,
            NodeId::Object { name, .. } => Some(name),
            NodeId::Column { column, .. } => Some(column),
        }
    }
}

/// Snapshot of the schema, grouped by kind. Rebuilt on demand.
#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    pub groups: Vec<(SchemaKind, Vec<SchemaObject>)>,
}

impl SchemaTree {
    pub fn load(db: &Database) -> Result<Self, QueryError> {
        let groups = SchemaKind::ALL
            .iter()
            .map(|&kind| Ok((kind, db.objects(kind)?)))
            .collect::<Result<Vec<_>, QueryError>>()?;
        Ok(Self { groups })
    }

    pub fn objects(&self, kind: SchemaKind) -> &[SchemaObject] {
        self.groups
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, objs)| objs.as_slice())
            .unwrap_or(&[])
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.objects(SchemaKind::Table)
            .iter()
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Tree items for `tui_tree_widget`. Branch nodes show their item count.
    pub fn to_tree_items(&self) -> io::Result<Vec<TreeItem<'static, NodeId>>> {
        self.groups
            .iter()
            .map(|(kind, objects)| {
                let children = objects
                    .iter()
                    .map(object_item)
                    .collect::<io::Result<Vec<_>>>()?;
                let label = Line::from(vec![
                    Span::styled(
                        kind.plural_label(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" ({})", objects.len()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);
                TreeItem::new(NodeId::Branch(*kind), label, children)
            })
            .collect()
    }
}

fn object_item(object: &SchemaObject) -> io::Result<TreeItem<'static, NodeId>> {
    let id = NodeId::Object {
        kind: object.kind,
        name: object.name.clone(),
    };
    if object.columns.is_empty() {
        return Ok(TreeItem::new_leaf(id, object.name.clone()));
    }
    let columns = object
        .columns
        .iter()
        .map(|col| {
            TreeItem::new_leaf(
                NodeId::Column {
                    table: object.name.clone(),
                    column: col.name.clone(),
                },
                Span::styled(col.label(), Style::default().fg(Color::Gray)),
            )
        })
        .collect();
    TreeItem::new(id, object.name.clone(), columns)
}

/// Text for the Structure view's detail pane. Branch nodes have none.
pub fn definition_text(db: &Database, node: &NodeId) -> Result<Option<String>, QueryError> {
    match node {
        NodeId::Branch(_) => Ok(None),
        NodeId::Object { name, .. } => {
            let sql = db.definition(name)?;
            Ok(Some(definition_or_placeholder(name, sql)))
        }
        NodeId::Column { table, .. } => {
            let sql = definition_or_placeholder(table, db.definition(table)?);
            Ok(Some(format!("-- Column from table: {}\n\n{}", table, sql)))
        }
    }
}

fn definition_or_placeholder(name: &str, sql: String) -> String {
    if sql.trim().is_empty() {
        format!("No SQL definition available for {}", name)
    } else {
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ColumnInfo;

    fn tree() -> SchemaTree {
        SchemaTree {
            groups: vec![
                (
                    SchemaKind::Table,
                    vec![SchemaObject {
                        kind: SchemaKind::Table,
                        name: "users".into(),
                        columns: vec![
                            ColumnInfo {
                                name: "id".into(),
                                data_type: "INTEGER".into(),
                                not_null: false,
                                default_value: None,
                            },
                            ColumnInfo {
                                name: "name".into(),
                                data_type: "TEXT".into(),
                                not_null: true,
                                default_value: None,
                            },
                        ],
                    }],
                ),
                (
                    SchemaKind::Index,
                    vec![SchemaObject {
                        kind: SchemaKind::Index,
                        name: "idx_users_name".into(),
                        columns: vec![],
                    }],
                ),
                (SchemaKind::View, vec![]),
                (SchemaKind::Trigger, vec![]),
            ],
        }
    }

    #[test]
    fn test_tree_items_shape() {
        let items = tree().to_tree_items().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].identifier(), &NodeId::Branch(SchemaKind::Table));
        assert_eq!(items[0].children().len(), 1);
        assert_eq!(items[0].children()[0].children().len(), 2);
        assert_eq!(
            items[0].children()[0].children()[1].identifier(),
            &NodeId::Column {
                table: "users".into(),
                column: "name".into()
            }
        );
        assert!(items[2].children().is_empty());
    }

    #[test]
    fn test_table_names() {
        assert_eq!(tree().table_names(), vec!["users"]);
        assert!(tree().objects(SchemaKind::View).is_empty());
    }

    #[test]
    fn test_node_name() {
        assert_eq!(NodeId::Branch(SchemaKind::View).name(), None);
        let col = NodeId::Column {
            table: "t".into(),
            column: "c".into(),
        };
        assert_eq!(col.name(), Some("c"));
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(
            definition_or_placeholder("sqlite_autoindex_x_1", String::new()),
            "No SQL definition available for sqlite_autoindex_x_1"
        );
        assert_eq!(
            definition_or_placeholder("t", "CREATE TABLE t(a)".into()),
            "CREATE TABLE t(a)"
        );
    }
}
