//! 冠脉区域树.
//!
//! 区域树以数组 (arena) 形式保存, 节点之间以下标相连. 名称索引在构建时一次生成.
//! 每个节点可以携带自己的标签值 (叶子, 或累积节点), 也可以仅汇总子节点.

use std::collections::HashMap;

use crate::error::{CacsError, CacsResult};
use crate::taxonomy::Taxonomy;

/// 区域定义.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Territory {
    /// 叶子区域, 分数直接来自同名标签.
    Leaf,

    /// 汇总区域, 分数为各子区域分数之和.
    Group(Vec<String>),

    /// 累积区域: 自身同名标签的分数加上各子区域分数.
    Cumulative(Vec<String>),
}

impl Territory {
    /// 由子区域名称构建汇总区域.
    pub fn group<S: ToString>(children: impl IntoIterator<Item = S>) -> Self {
        Territory::Group(children.into_iter().map(|s| s.to_string()).collect())
    }

    /// 由子区域名称构建累积区域.
    pub fn cumulative<S: ToString>(children: impl IntoIterator<Item = S>) -> Self {
        Territory::Cumulative(children.into_iter().map(|s| s.to_string()).collect())
    }

    fn children(&self) -> &[String] {
        match self {
            Territory::Leaf => &[],
            Territory::Group(c) | Territory::Cumulative(c) => c,
        }
    }
}

/// 树上的一个节点.
#[derive(Clone, Debug)]
pub struct Node {
    name: String,
    value: Option<u8>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Node {
    /// 区域名称.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 该区域自身对应的标签值. 纯汇总区域返回 `None`.
    #[inline]
    pub fn value(&self) -> Option<u8> {
        self.value
    }

    /// 父节点下标. 根节点返回 `None`.
    #[inline]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// 子节点下标, 按定义顺序.
    #[inline]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// 是否为叶子节点?
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// 冠脉区域树.
#[derive(Clone, Debug)]
pub struct ArteryGrouping {
    taxonomy: Taxonomy,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    preorder: Vec<usize>,
}

impl ArteryGrouping {
    /// 以 `root` 为根构建区域树. 节点的标签值在 `taxonomy` 中按名称查找.
    ///
    /// 子区域若未在 `defs` 中定义, 则视为叶子. 以下情况构建失败:
    ///
    /// 1. 叶子或累积区域的名称不是 `taxonomy` 的标签: [`CacsError::UnknownLabel`];
    /// 2. 根或某个子区域既未定义也不是标签: [`CacsError::UnknownTerritory`];
    /// 3. 某区域有多个父区域, 存在环, 或有区域不可从根到达: [`CacsError::CyclicGrouping`].
    pub fn new<S: Into<String>>(
        taxonomy: Taxonomy,
        root: &str,
        defs: impl IntoIterator<Item = (S, Territory)>,
    ) -> CacsResult<Self> {
        let defs: Vec<(String, Territory)> = defs.into_iter().map(|(n, t)| (n.into(), t)).collect();
        let mut nodes: Vec<Node> = Vec::with_capacity(defs.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(defs.len());

        for (name, territory) in defs.iter() {
            if index.contains_key(name) {
                return Err(CacsError::CyclicGrouping(name.clone()));
            }
            let value = match territory {
                Territory::Group(_) => None,
                Territory::Leaf | Territory::Cumulative(_) => Some(taxonomy.value_of(name)?),
            };
            index.insert(name.clone(), nodes.len());
            nodes.push(Node {
                name: name.clone(),
                value,
                parent: None,
                children: vec![],
            });
        }

        if !index.contains_key(root) {
            match taxonomy.value_of(root) {
                Ok(value) => {
                    index.insert(root.to_owned(), nodes.len());
                    nodes.push(Node {
                        name: root.to_owned(),
                        value: Some(value),
                        parent: None,
                        children: vec![],
                    });
                }
                Err(_) => return Err(CacsError::UnknownTerritory(root.to_owned())),
            }
        }

        for (name, territory) in defs.iter() {
            let parent = index[name];
            for child in territory.children() {
                let child_idx = match index.get(child) {
                    Some(&i) => i,
                    None => {
                        let value = taxonomy
                            .value_of(child)
                            .map_err(|_| CacsError::UnknownTerritory(child.clone()))?;
                        index.insert(child.clone(), nodes.len());
                        nodes.push(Node {
                            name: child.clone(),
                            value: Some(value),
                            parent: None,
                            children: vec![],
                        });
                        nodes.len() - 1
                    }
                };
                if nodes[child_idx].parent.is_some() || child_idx == parent {
                    return Err(CacsError::CyclicGrouping(child.clone()));
                }
                nodes[child_idx].parent = Some(parent);
                nodes[parent].children.push(child_idx);
            }
        }

        let root_idx = index[root];
        if nodes[root_idx].parent.is_some() {
            return Err(CacsError::CyclicGrouping(root.to_owned()));
        }

        // 每个节点至多一个父节点, 因此从根出发的 DFS 不会重复访问;
        // 访问不到的节点必然处于不含根的环中.
        let mut preorder = Vec::with_capacity(nodes.len());
        let mut stack = vec![root_idx];
        while let Some(cur) = stack.pop() {
            preorder.push(cur);
            stack.extend(nodes[cur].children.iter().rev());
        }
        if preorder.len() != nodes.len() {
            let stray = nodes
                .iter()
                .enumerate()
                .find(|(i, _)| !preorder.contains(i))
                .map(|(_, n)| n.name.clone())
                .unwrap_or_default();
            return Err(CacsError::CyclicGrouping(stray));
        }

        Ok(Self {
            taxonomy,
            nodes,
            index,
            preorder,
        })
    }

    /// 节点值所属的标签体系.
    #[inline]
    pub fn taxonomy(&self) -> Taxonomy {
        self.taxonomy
    }

    /// 根节点下标.
    #[inline]
    pub fn root(&self) -> usize {
        self.preorder[0]
    }

    /// 节点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 区域树总是至少包含根节点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 按下标获取节点.
    #[inline]
    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// 按名称获取节点下标.
    #[inline]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// 先序 (深度优先) 下标序列, 即导出列的顺序.
    #[inline]
    pub fn preorder(&self) -> &[usize] {
        &self.preorder
    }

    /// 后序下标序列. 每个节点都排在其所有子孙之后.
    pub fn postorder(&self) -> Vec<usize> {
        let mut ans = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root(), false)];
        while let Some((cur, expanded)) = stack.pop() {
            if expanded {
                ans.push(cur);
                continue;
            }
            stack.push((cur, true));
            stack.extend(self.nodes[cur].children.iter().rev().map(|c| (*c, false)));
        }
        ans
    }

    /// 按先序排列的区域名称.
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.preorder.iter().map(|i| self.nodes[*i].name())
    }

    /// 对每个节点执行自底向上的求值. `eval(node, children_results)` 在所有子节点
    /// 求值完成后调用. 结果按节点下标存储.
    pub fn fold<T>(&self, mut eval: impl FnMut(&Node, Vec<&T>) -> T) -> Vec<T> {
        let mut slots: Vec<Option<T>> = (0..self.nodes.len()).map(|_| None).collect();
        for idx in self.postorder() {
            let node = &self.nodes[idx];
            let parts = node
                .children
                .iter()
                .filter_map(|c| slots[*c].as_ref())
                .collect();
            let value = eval(node, parts);
            slots[idx] = Some(value);
        }
        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cacs() -> ArteryGrouping {
        ArteryGrouping::new(
            Taxonomy::ArteryLevel,
            "CC",
            [("CC", Territory::group(["RCA", "LAD", "LCX"]))],
        )
        .unwrap()
    }

    #[test]
    fn test_implicit_leaves() {
        let g = cacs();
        assert_eq!(g.len(), 4);
        assert_eq!(g.columns().collect::<Vec<_>>(), ["CC", "RCA", "LAD", "LCX"]);
        let lad = g.find("LAD").unwrap();
        assert_eq!(g.node(lad).value(), Some(2));
        assert_eq!(g.node(lad).parent(), Some(g.root()));
        assert_eq!(g.node(g.root()).value(), None);
    }

    #[test]
    fn test_postorder_children_first() {
        let g = ArteryGrouping::new(
            Taxonomy::SegmentLevel,
            "CC",
            [
                ("CC", Territory::cumulative(["RCA", "LAD"])),
                ("RCA", Territory::cumulative(["RCA_PROXIMAL", "RCA_MID"])),
                ("LAD", Territory::cumulative(["LAD_PROXIMAL"])),
            ],
        )
        .unwrap();
        let post = g.postorder();
        let pos = |name| post.iter().position(|i| g.node(*i).name() == name).unwrap();
        assert!(pos("RCA_PROXIMAL") < pos("RCA"));
        assert!(pos("RCA") < pos("CC"));
        assert!(pos("LAD") < pos("CC"));
        assert_eq!(*post.last().unwrap(), g.root());
        assert_eq!(
            g.columns().collect::<Vec<_>>(),
            ["CC", "RCA", "RCA_PROXIMAL", "RCA_MID", "LAD", "LAD_PROXIMAL"]
        );
    }

    #[test]
    fn test_grouping_summation() {
        let g = cacs();
        let leaf = HashMap::from([("RCA", 10.0), ("LAD", 20.0), ("LCX", 0.0)]);
        let scores = g.fold(|node, parts: Vec<&f64>| {
            leaf.get(node.name()).copied().unwrap_or(0.0) + parts.into_iter().sum::<f64>()
        });
        assert_eq!(scores[g.root()], 30.0);
    }

    #[test]
    fn test_unknown_territory() {
        let err = ArteryGrouping::new(
            Taxonomy::ArteryLevel,
            "CC",
            [("CC", Territory::group(["RCA", "NOPE"]))],
        )
        .unwrap_err();
        assert!(matches!(err, CacsError::UnknownTerritory(n) if n == "NOPE"));

        let err = ArteryGrouping::new(Taxonomy::ArteryLevel, "ROOT", Vec::<(&str, _)>::new())
            .unwrap_err();
        assert!(matches!(err, CacsError::UnknownTerritory(_)));
    }

    #[test]
    fn test_unknown_label() {
        let err = ArteryGrouping::new(
            Taxonomy::ArteryLevel,
            "CC",
            [("CC", Territory::cumulative(["RCA"]))],
        )
        .unwrap_err();
        assert!(matches!(err, CacsError::UnknownLabel { .. }));
    }

    #[test]
    fn test_cycles_rejected() {
        let err = ArteryGrouping::new(
            Taxonomy::ArteryLevel,
            "CC",
            [
                ("CC", Territory::group(["A"])),
                ("A", Territory::group(["B"])),
                ("B", Territory::group(["A"])),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CacsError::CyclicGrouping(_)));

        let err = ArteryGrouping::new(
            Taxonomy::ArteryLevel,
            "CC",
            [
                ("CC", Territory::group(["A", "RCA"])),
                ("A", Territory::group(["RCA"])),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CacsError::CyclicGrouping(n) if n == "RCA"));

        let err = ArteryGrouping::new(
            Taxonomy::ArteryLevel,
            "CC",
            [
                ("CC", Territory::group(["LAD"])),
                ("A", Territory::group(["B"])),
                ("B", Territory::group(["A"])),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CacsError::CyclicGrouping(_)));
    }
}
