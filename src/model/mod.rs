mod route;
mod spec;

pub use route::{HttpMethod, MediaTypeModel, OperationModel, OrderedMap, ParameterModel, PathItemModel, RequestBodyModel, RequestData, RouteName, SchemaRefModel};
pub use spec::{SpecModel, SpecVersion};
