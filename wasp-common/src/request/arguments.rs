use std::fmt::Display;
use serde::Serialize;
use serde_json::Value;

/// 单次调用的实参，按声明顺序收集
///
/// 生成的客户端为每个参数调用对应的方法；动态服务直接构造。
#[derive(Debug, Default)]
pub struct Arguments {
    pub(crate) path: Vec<(String, String)>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Result<Value, serde_json::Error>>,
    pub(crate) fields: Vec<(String, String)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, name: &str, value: impl Display) -> Self {
        self.path.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: impl Display) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// `None` 不产生查询参数
    pub fn query_opt<V: Display>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    pub fn query_map<K, V>(mut self, map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Display,
        V: Display,
    {
        self.query
            .extend(map.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    pub fn header(mut self, name: &str, value: impl Display) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header_opt<V: Display>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.header(name, value),
            None => self,
        }
    }

    /// 序列化失败会保留到构建请求时再报告
    pub fn body<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.body = Some(serde_json::to_value(value));
        self
    }

    pub fn field(mut self, name: &str, value: impl Display) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn field_opt<V: Display>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    pub fn field_map<K, V>(mut self, map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Display,
        V: Display,
    {
        self.fields
            .extend(map.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }
}
