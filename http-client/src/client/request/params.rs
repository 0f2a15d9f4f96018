use indexmap::IndexMap;
use std::iter::FromIterator;

/// 请求参数集合
///
/// 一个键可以对应多个值，键按照首次插入的顺序排列，同一个键的值保持插入顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: IndexMap<String, Vec<String>>,
}

impl Params {
    /// 追加参数
    #[inline]
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.inner.entry(key.into()).or_default().push(value.into());
        self
    }

    /// 获取参数的第一个值
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .get(key)
            .and_then(|values| values.first())
            .map(|value| value.as_str())
    }

    /// 获取参数的所有值
    #[inline]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(|values| values.as_slice()).unwrap_or_default()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// 参数键的数量
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// 按顺序遍历所有键值对
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |value| (key.as_str(), value.as_str())))
    }

    /// 编码为 `application/x-www-form-urlencoded` 格式
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// 在已有的编码结果后追加当前参数的编码
    pub(super) fn encode_after(&self, encoded: &mut String) {
        if self.is_empty() {
            return;
        }
        if !encoded.is_empty() {
            encoded.push('&');
        }
        encoded.push_str(&self.encode());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::default();
        params.extend(iter);
        params
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Params {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_order_and_encode() {
        env_logger::builder().is_test(true).try_init().ok();

        let mut params = Params::default();
        params.add("b", "1").add("a", "x y").add("b", "2").add("c", "&=");
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("b"), Some("1"));
        assert_eq!(params.get_all("b"), &["1".to_owned(), "2".to_owned()]);
        assert!(params.get_all("missing").is_empty());
        assert_eq!(params.encode(), "b=1&b=2&a=x+y&c=%26%3D");
    }

    #[test]
    fn test_params_urlencoded_round_trip() {
        env_logger::builder().is_test(true).try_init().ok();

        let params: Params = vec![("k", "v1"), ("k", "v 2"), ("中文", "值"), ("k", "v3")]
            .into_iter()
            .collect();
        let decoded: Params = form_urlencoded::parse(params.encode().as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(decoded, params);
        assert_eq!(decoded.get_all("k"), &["v1".to_owned(), "v 2".to_owned(), "v3".to_owned()]);
    }

    #[test]
    fn test_encode_after() {
        env_logger::builder().is_test(true).try_init().ok();

        let mut encoded = String::new();
        Params::default().encode_after(&mut encoded);
        assert_eq!(encoded, "");

        let query: Params = vec![("q", "x")].into_iter().collect();
        query.encode_after(&mut encoded);
        let auto: Params = vec![("page", "2")].into_iter().collect();
        auto.encode_after(&mut encoded);
        assert_eq!(encoded, "q=x&page=2");
    }
}
