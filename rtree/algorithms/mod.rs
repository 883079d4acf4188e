// R-tree算法模块
//
// - search: 边界框查询
// - insert: 插入和ChooseLeaf
// - split: 二次分裂
// - delete: 删除和CondenseTree
// - utils: 路径访问与MBR向上调整

pub mod delete;
pub mod insert;
pub mod search;
pub mod split;
pub mod utils;
