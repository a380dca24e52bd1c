//! The operator resolution ladder: by National Operator Code, else licence
//! number, else name (case-insensitive exact), else a region-local operator
//! code mapped through the OperatorCode table. The parsers already reduce a
//! trip's operator reference down to the single best identifier they can
//! find in the document; this is the lookup side that turns that string
//! into a stored `Operator`.

use model::operator::Operator;
use schedule_store::OperatorRepo;
use utility::id::Id;

use crate::error::Result;

/// Resolves `operator_ref` (as produced by a parser) against known
/// operators, trying it in turn as a code, a licence number, a name, and a
/// region-local alias. A reference no rung recognises is logged and the
/// trip keeps no operator.
pub async fn resolve<Ops: OperatorRepo + Send>(
    ops: &mut Ops,
    operator_ref: Option<&str>,
) -> Result<Option<Id<Operator>>> {
    let Some(operator_ref) = operator_ref else {
        return Ok(None);
    };

    if let Some(operator) = ops.operator_by_code(operator_ref).await? {
        return Ok(Some(Id::new(operator.code)));
    }
    if let Some(operator) = ops.operator_by_licence_number(operator_ref).await? {
        return Ok(Some(Id::new(operator.code)));
    }
    if let Some(operator) = ops.operator_by_name(operator_ref).await? {
        return Ok(Some(Id::new(operator.code)));
    }
    if let Some(mapping) = ops.operator_code_mapping(operator_ref).await? {
        if let Some(operator) = ops.operator_by_code(&mapping.operator_id.raw()).await? {
            return Ok(Some(Id::new(operator.code)));
        }
    }

    log::warn!("operator {operator_ref:?} not found by code, licence, name, or alias; keeping the trip with no operator");
    Ok(None)
}
