mod builder;
pub use builder::Builder;

mod def;
pub use def::{FieldDef, ModelDef};

mod field;
pub use field::{Field, FieldId, FieldTy, Precision};

mod model;
pub use model::{Index, Model, ModelId};

mod registry;
pub use registry::{JoinColumns, Registry};

mod relation;
pub use relation::{Relation, RelationKind};
