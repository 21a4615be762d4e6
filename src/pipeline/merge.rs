//! 合并解析器：维护 child -> root 映射与每个 root 的累计丰度。
//!
//! 分组深度恒为 1（root + 直接成员）：当 parent 自身已是某组成员时，
//! child 直接挂到该组的 root 上（grandparent 提升），不形成链。

use std::collections::BTreeMap;

use crate::table::Taxon;

/// Where a confirmed child ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// parent was a root; child joined its group
    Parent(usize),
    /// parent was already merged; child joined the parent's root
    Grandparent(usize),
}

impl Attachment {
    pub fn root(self) -> usize {
        match self {
            Attachment::Parent(r) | Attachment::Grandparent(r) => r,
        }
    }
}

/// 一个合并组：root、成员（按合并顺序）、累计丰度向量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    pub root: usize,
    pub members: Vec<usize>,
    pub counts: Vec<u64>,
}

/// Group state addressed by rank index. Groups are created on the first
/// merge into a root and only ever grow.
#[derive(Debug, Clone)]
pub struct MergeResolver {
    root_of: Vec<Option<usize>>,
    groups: BTreeMap<usize, MergeGroup>,
}

impl MergeResolver {
    pub fn new(n: usize) -> Self {
        Self { root_of: vec![None; n], groups: BTreeMap::new() }
    }

    #[inline]
    pub fn is_claimed(&self, taxon: usize) -> bool {
        self.root_of[taxon].is_some()
    }

    /// Root of a taxon in one lookup; roots and untouched taxa map to themselves.
    #[inline]
    pub fn root_of(&self, taxon: usize) -> usize {
        self.root_of[taxon].unwrap_or(taxon)
    }

    /// Record a confirmed (parent, child) pair and add the child's counts to
    /// the root's working vector.
    pub fn merge(&mut self, taxa: &[Taxon], parent: usize, child: usize) -> Attachment {
        debug_assert!(parent != child);
        debug_assert!(!self.is_claimed(child), "taxon {} claimed twice", child);

        let attachment = match self.root_of[parent] {
            Some(root) => Attachment::Grandparent(root),
            None => Attachment::Parent(parent),
        };
        let root = attachment.root();

        // a child that already heads a group brings its members along,
        // which only happens when pairs arrive out of scan order
        let absorbed = self.groups.remove(&child);

        let group = self.groups.entry(root).or_insert_with(|| MergeGroup {
            root,
            members: Vec::new(),
            counts: taxa[root].counts.clone(),
        });

        match absorbed {
            Some(sub) => {
                add_into(&mut group.counts, &sub.counts);
                group.members.push(child);
                for &m in &sub.members {
                    self.root_of[m] = Some(root);
                }
                group.members.extend(sub.members);
            }
            None => {
                add_into(&mut group.counts, &taxa[child].counts);
                group.members.push(child);
            }
        }
        self.root_of[child] = Some(root);
        attachment
    }

    pub fn merged_count(&self) -> usize {
        self.root_of.iter().filter(|r| r.is_some()).count()
    }

    /// Groups in root rank order.
    pub fn groups(&self) -> impl Iterator<Item = &MergeGroup> {
        self.groups.values()
    }

    pub fn group(&self, root: usize) -> Option<&MergeGroup> {
        self.groups.get(&root)
    }

    /// Every taxon never claimed as a child, with its (possibly merged) counts.
    pub fn survivors<'a>(&'a self, taxa: &'a [Taxon]) -> impl Iterator<Item = (usize, &'a [u64])> + 'a {
        (0..taxa.len()).filter(move |&i| !self.is_claimed(i)).map(move |i| {
            let counts = self.group(i).map_or(taxa[i].counts.as_slice(), |g| g.counts.as_slice());
            (i, counts)
        })
    }
}

fn add_into(acc: &mut [u64], add: &[u64]) {
    for (a, &b) in acc.iter_mut().zip(add) {
        *a += b;
    }
}
