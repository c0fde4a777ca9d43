//! Joins over column sets.
//!
//! A [`Join`] is a value: a left side plus an ordered list of
//! [`JoinPart`]s. Its columns are the concatenation of both sides'
//! columns, and it renders its own FROM fragment, `NATURAL` parts with no
//! `ON` clause.

use super::ColumnSet;
use super::column::{AnyColumn, Column};
use crate::builder::SqlBuilder;
use crate::error::Result;
use crate::expr::{CmpOp, Expr, Expression, IntoOperandList};
use crate::query::SelectFrom;
use crate::types::Persisted;

/// The join operator between two column sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Cross,
    Natural,
}

impl JoinType {
    pub const fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Cross => "CROSS",
            JoinType::Natural => "NATURAL",
        }
    }
}

/// One step of a join chain.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPart {
    pub(crate) join_type: JoinType,
    pub(crate) right: ColumnSet,
    pub(crate) on_left: Option<AnyColumn>,
    pub(crate) on_right: Option<AnyColumn>,
    pub(crate) extra: Option<Expr>,
}

/// A left side joined to further column sets. Referentially transparent:
/// joins compose by value and never mutate their constituents.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub(crate) left: Box<ColumnSet>,
    pub(crate) parts: Vec<JoinPart>,
}

impl Join {
    pub fn new(left: impl Into<ColumnSet>) -> Join {
        Join {
            left: Box::new(left.into()),
            parts: Vec::new(),
        }
    }

    /// Joins `right` on `left_column = right_column`.
    pub fn join<T: Persisted>(
        self,
        join_type: JoinType,
        right: impl Into<ColumnSet>,
        left_column: &Column<T>,
        right_column: &Column<T>,
    ) -> Join {
        self.push(JoinPart {
            join_type,
            right: right.into(),
            on_left: Some(left_column.erase()),
            on_right: Some(right_column.erase()),
            extra: None,
        })
    }

    /// Joins `right` on the column pair conjoined with an extra
    /// predicate.
    pub fn join_on<T: Persisted>(
        self,
        join_type: JoinType,
        right: impl Into<ColumnSet>,
        left_column: &Column<T>,
        right_column: &Column<T>,
        extra: Expression<bool>,
    ) -> Join {
        self.push(JoinPart {
            join_type,
            right: right.into(),
            on_left: Some(left_column.erase()),
            on_right: Some(right_column.erase()),
            extra: Some(extra.into_node()),
        })
    }

    /// Joins with no ON constraint: `NATURAL` and `CROSS` joins.
    pub fn unconstrained(self, join_type: JoinType, right: impl Into<ColumnSet>) -> Join {
        self.push(JoinPart {
            join_type,
            right: right.into(),
            on_left: None,
            on_right: None,
            extra: None,
        })
    }

    fn push(mut self, part: JoinPart) -> Join {
        self.parts.push(part);
        self
    }

    /// Both sides' columns, in order; duplicates are allowed.
    pub fn columns(&self) -> Vec<AnyColumn> {
        let mut out = self.left.columns();
        for part in &self.parts {
            out.extend(part.right.columns());
        }
        out
    }

    pub fn select(&self, columns: impl IntoOperandList) -> SelectFrom {
        SelectFrom::new(columns.into_operand_list(), self.clone().into())
    }

    pub fn select_all(&self) -> SelectFrom {
        let columns = self.columns().iter().map(|c| c.node()).collect();
        SelectFrom::new(columns, self.clone().into())
    }

    pub(crate) fn append_from(&self, b: &mut SqlBuilder) -> Result<()> {
        self.left.append_from(b)?;
        for part in &self.parts {
            b.append_char(' ')
                .append(part.join_type.keyword())
                .append(" JOIN ");
            part.right.append_from(b)?;
            let constraint = part.constraint_node();
            if let Some(constraint) = constraint {
                b.append(" ON ");
                constraint.append_to(b)?;
            }
        }
        Ok(())
    }
}

impl JoinPart {
    /// `left.col = right.col [AND extra]`; `None` for NATURAL and CROSS
    /// parts.
    fn constraint_node(&self) -> Option<Expr> {
        if self.join_type == JoinType::Natural {
            return None;
        }
        let pair = match (&self.on_left, &self.on_right) {
            (Some(left), Some(right)) => Some(Expr::Cmp {
                op: CmpOp::Eq,
                lhs: Box::new(left.node()),
                rhs: Box::new(right.node()),
            }),
            _ => None,
        };
        match (pair, &self.extra) {
            (Some(pair), Some(extra)) => Some(Expr::Connective {
                op: crate::expr::Connective::And,
                parts: vec![pair, extra.clone()],
            }),
            (Some(pair), None) => Some(pair),
            (None, Some(extra)) => Some(extra.clone()),
            (None, None) => None,
        }
    }
}

impl From<Join> for ColumnSet {
    fn from(join: Join) -> Self {
        ColumnSet::Join(Box::new(join))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_str;
    use crate::source::table::TableBuilder;

    fn artist_album() -> (
        crate::source::table::Table,
        Column<i64>,
        crate::source::table::Table,
        Column<i64>,
    ) {
        let mut artist_tb = TableBuilder::new("Artist").unwrap();
        let artist_id = artist_tb.column::<i64>("ArtistId", |c| c.primary_key());
        artist_tb.column::<String>("ArtistName", |c| c);
        let artist = artist_tb.build().unwrap();

        let mut album_tb = TableBuilder::new("Album").unwrap();
        album_tb.column::<i64>("AlbumId", |c| c.primary_key());
        let album_artist = album_tb.column::<i64>("ArtistId", |c| c);
        let album = album_tb.build().unwrap();

        (artist, artist_id, album, album_artist)
    }

    fn render(join: &Join) -> String {
        build_str(|b| join.append_from(b)).unwrap()
    }

    #[test]
    fn inner_join_renders_on_clause() {
        let (artist, artist_id, album, album_artist) = artist_album();
        let join = artist.inner_join(&album, &artist_id, &album_artist);
        assert_eq!(
            render(&join),
            "\"Artist\" INNER JOIN \"Album\" ON \"Artist\".\"ArtistId\" = \"Album\".\"ArtistId\""
        );
    }

    #[test]
    fn natural_join_has_no_on() {
        let (artist, _, album, _) = artist_album();
        let join = artist.natural_join(&album);
        assert_eq!(render(&join), "\"Artist\" NATURAL JOIN \"Album\"");
    }

    #[test]
    fn cross_join_renders() {
        let (artist, _, album, _) = artist_album();
        let join = artist.cross_join(&album);
        assert_eq!(render(&join), "\"Artist\" CROSS JOIN \"Album\"");
    }

    #[test]
    fn extra_predicate_is_conjoined() {
        let (artist, artist_id, album, album_artist) = artist_album();
        let join = Join::new(artist.clone()).join_on(
            JoinType::Left,
            album,
            &artist_id,
            &album_artist,
            artist_id.greater(0i64),
        );
        assert_eq!(
            render(&join),
            "\"Artist\" LEFT JOIN \"Album\" ON \"Artist\".\"ArtistId\" = \"Album\".\"ArtistId\" \
             AND \"Artist\".\"ArtistId\" > 0"
        );
    }

    #[test]
    fn join_columns_concatenate() {
        let (artist, _, album, _) = artist_album();
        let join = artist.cross_join(&album);
        let columns = join.columns();
        let names: Vec<&str> = columns.iter().map(|c| c.name().unquoted()).collect();
        assert_eq!(names, ["ArtistId", "ArtistName", "AlbumId", "ArtistId"]);
    }
}
