//! Build a [`UserContext`] from the user-item matrix.

use crate::matrix::UserItemMatrix;
use crate::types::UserContext;
use data_loader::UserId;

/// Collect the user's visited attractions (cells `> 0`)
///
/// Returns `None` when the user has no row in the matrix.
pub fn build_user_context(matrix: &UserItemMatrix, user_id: UserId) -> Option<UserContext> {
    let row = matrix.user_row(user_id)?;

    let mut context = UserContext::new(user_id);
    context.visited = row
        .into_iter()
        .filter(|&(_, rating)| rating > 0.0)
        .map(|(attraction_id, _)| attraction_id)
        .collect();

    Some(context)
}
